use clap::Parser;
use osm_poi_gpx::{Args, Config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match Config::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    match osm_poi_gpx::run(&config) {
        Ok(summary) => log::info!(
            "{} downloaded, {} already exported, {} written to {}",
            summary.downloaded,
            summary.filtered_out,
            summary.saved,
            summary.output.display()
        ),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}
