//! Quote Client. Приложение для получения смет от Quote Server.

use log::{error, info};
use std::process::exit;

mod cli;
mod client;
mod config;
mod report;

use cli::parse_cli_args;
use client::{Reply, send_command};
use commons::init_simple_logger;
use commons::utils::get_workspace_root;
use config::LOG_FOLDER;

/// Перечисление ошибок при завершении приложения.
#[derive(Copy, Clone)]
#[repr(u8)]
enum ExitCode {
    /// Запрос не удалось сформировать.
    InvalidRequest = 1,
    /// Сервер недоступен или нарушил протокол.
    ServerUnavailable,
    /// Сервер отклонил запрос.
    Rejected,
    /// Ответ сервера не удалось разобрать.
    InvalidResponse,
}

impl ExitCode {
    /// Предоставить цифровое значение выбранного перечисления (`u8`).
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

fn main() {
    init_logger();
    info!("Quote Client запущен");

    let settings = parse_cli_args()
        .unwrap_or_else(|err| exit_err(&err.to_string(), ExitCode::InvalidRequest));
    info!("Параметры: {}", settings);

    let reply = send_command(settings.server_addr, &settings.command)
        .unwrap_or_else(|err| exit_err(&err.to_string(), ExitCode::ServerUnavailable));

    match reply {
        Reply::Ok(body) => match report::render(settings.kind, &body) {
            Ok(text) => println!("{text}"),
            Err(err) => exit_err(&err.to_string(), ExitCode::InvalidResponse),
        },
        Reply::Err(message) => exit_err(
            &format!("сервер отклонил запрос: {message}"),
            ExitCode::Rejected,
        ),
    }
}

/// Опубликовать сообщение об ошибке и завершить работу приложения.
fn exit_err(message: &str, code: ExitCode) -> ! {
    error!("Ошибка: {} (код {})", message, code.value());
    eprintln!("Ошибка: {}", message);
    exit(code.value() as i32);
}

/// Инициализировать логгер приложения.
///
/// Используется метод [`init_simple_logger`] из крейта [`commons`].
fn init_logger() {
    let log_folder = get_workspace_root().join(LOG_FOLDER);
    let app_name = env!("CARGO_PKG_NAME");
    init_simple_logger(app_name, log_folder);
}
