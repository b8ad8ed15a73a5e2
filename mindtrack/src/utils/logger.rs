use colored::Colorize;

pub fn log_fatal(message: String) {
    log::error!("{}", message.red());
}
