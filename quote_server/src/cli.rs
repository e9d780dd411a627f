//! Обработка аргументов командной строки при запуске приложения.
//! ## Пример
//!
//! ```
//! $ qserver --port 8888 --max-area 5000 --sales-email ventas@empresa.com.ar
//! ```

use crate::config::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_SALES_EMAIL, DEFAULT_SERVER_PORT, SERVER_ADDRESS,
    TCP_PORTS_ALLOWED,
};
use calculator::settings::DEFAULT_MAX_AREA_M2;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(about = "Quote Server. Construction and solar installation quotes over TCP.")]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// TCP port to listen on (server binds to 127.0.0.1:PORT).
    #[clap(short, long, required = false, default_value_t = DEFAULT_SERVER_PORT, value_parser=port_in_range)]
    port: u16,

    /// Maximum accepted construction area, m².
    #[clap(long, default_value_t = DEFAULT_MAX_AREA_M2, value_parser=positive_area)]
    max_area: f64,

    /// Internal sales mailbox that receives a copy of every quote.
    #[clap(long, default_value = DEFAULT_SALES_EMAIL)]
    sales_email: String,

    /// Time limit for loading the price table or the catalog, ms.
    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS)]
    fetch_timeout_ms: u64,
}

/// Валидатор для поля `port`.
fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s.parse().map_err(|_| format!("invalid port number: {s}"))?;
    if TCP_PORTS_ALLOWED.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port number {} not in range {}..{}",
            s,
            TCP_PORTS_ALLOWED.start(),
            TCP_PORTS_ALLOWED.end()
        ))
    }
}

/// Валидатор для поля `max_area`.
fn positive_area(s: &str) -> Result<f64, String> {
    let area: f64 = s.parse().map_err(|_| format!("invalid area: {s}"))?;
    if area.is_finite() && area > 0.0 {
        Ok(area)
    } else {
        Err(format!("area must be positive, got {s}"))
    }
}

/// Параметры, полученные из командной строки при запуске приложения.
#[derive(Debug, Clone)]
pub struct ServerSet {
    /// Адрес работы TCP-сервера.
    pub server_addr: SocketAddr,
    /// Максимальная площадь строительства, м².
    pub max_area_m2: f64,
    /// Ящик отдела продаж.
    pub sales_email: String,
    /// Предельное время получения данных от источников.
    pub fetch_timeout: Duration,
}

impl ServerSet {
    /// Создать экземпляр на основе аргументов из командной строки.
    fn new(args: &CliArgs) -> Self {
        Self {
            server_addr: Self::get_server_addr(args.port),
            max_area_m2: args.max_area,
            sales_email: args.sales_email.trim().to_string(),
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
        }
    }

    /// Предоставить адрес TCP-сервера.
    fn get_server_addr(port: u16) -> SocketAddr {
        SocketAddr::from((SERVER_ADDRESS, port))
    }
}

/// Получить от пользователя первичные настройки приложения.
pub fn parse_cli_args() -> ServerSet {
    let args = CliArgs::parse();

    ServerSet::new(&args)
}
