use log::LevelFilter;
use thiserror::Error;

pub fn setup(level: LevelFilter) -> Result<(), LogError> {
    if level.eq(&LevelFilter::Off) {
        return Ok(());
    }

    fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            let time = chrono::Local::now();
            out.finish(format_args!(
                "[{} {}] {}",
                time.format("%Y-%m-%d %H:%M"),
                record.level(),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply()
        .map_err(LogError::SetLoggerError)
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Logger initialization error.")]
    SetLoggerError(log::SetLoggerError),
}
