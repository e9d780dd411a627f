//! Quote Server. Консольное приложение расчёта смет строительства и
//! солнечных станций. Принимает запросы по TCP, сохраняет заявки и
//! готовит письма клиенту и отделу продаж.

#![warn(missing_docs)]

use commons::init_simple_logger;
use commons::utils::get_workspace_root;
use log::error;
use std::process::ExitCode;

mod channels;
mod cli;
mod config;
mod models;
mod notify;
mod pdf;
mod persistence;
mod provider;
mod service;
mod tcp;

use cli::parse_cli_args;
use config::LOG_FOLDER;
use tcp::run_server;

fn main() -> ExitCode {
    // Инициализация логгера.
    init_logger();

    let settings = parse_cli_args();
    match run_server(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Сервер остановлен с ошибкой: {}", err);
            eprintln!("Ошибка: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Инициализировать логгер приложения.
///
/// Используется метод [`init_simple_logger`] из крейта [`commons`].
fn init_logger() {
    let log_folder = get_workspace_root().join(LOG_FOLDER);
    let app_name = env!("CARGO_PKG_NAME");
    init_simple_logger(app_name, log_folder);
}
