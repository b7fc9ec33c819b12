use entrapment_cli::input::{command, Input};
use entrapment_cli::output::summary_lines;
use entrapment_cli::runner::Runner;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ENTRAPMENT_LOG", "error,entrapment=info"))
        .init();

    let matches = command().get_matches();

    let input = Input::from_arguments(matches)?;

    let runner = input.build().and_then(Runner::new)?;
    let summary = runner.run()?;

    for line in summary_lines(&summary) {
        println!("{}", line);
    }

    Ok(())
}
