use lc_lpp::process::{parse_cli, run};
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match parse_cli() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("received args: {:?}", config);

    match run(&config) {
        Ok(reports) => info!("done, processed {} file(s)", reports.len()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
