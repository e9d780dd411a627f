//! Конфигурационный файл Quote Client.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Название директории для log-файлов.
pub const LOG_FOLDER: &str = "log";

/// Адрес TCP-сервера по умолчанию.
pub const DEFAULT_SERVER_SOCKET: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Порт для подключения к TCP-серверу по умолчанию.
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Диапазон разрешённых TCP-портов.
pub const ALLOW_TCP_PORTS: RangeInclusive<u16> = RangeInclusive::new(1024, 49151);

/// Строка, после которой сервер принимает команды.
pub const READY_MARKER: &str = "READY";

/// Таймаут установки соединения.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Таймаут ожидания ответа сервера.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
