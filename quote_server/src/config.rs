//! Конфигурация приложения.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Каталог log-файлов относительно корня workspace.
pub const LOG_FOLDER: &str = "log";

/// Название каталога для хранения данных проекта.
pub const DATA_FOLDER: &str = "data";

/// Прайс-лист базовых ставок строительства.
pub const PRICES_FILENAME: &str = "prices.json";

/// Каталог оборудования для солнечных станций.
pub const CATALOG_FILENAME: &str = "solar_catalog.json";

/// Файл заявок (одна запись на строку).
pub const LEADS_FILENAME: &str = "leads.txt";

/// Каталог сформированных писем.
pub const OUTBOX_FOLDER: &str = "outbox";

/// Адрес, на котором слушает сервер.
pub const SERVER_ADDRESS: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Порт сервера по умолчанию.
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Допустимый диапазон портов TCP.
pub const TCP_PORTS_ALLOWED: RangeInclusive<usize> = 1024..=49151;

/// Предельное время получения прайс-листа или каталога, мс.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 3_000;

/// Время жизни кэша прайс-листа, секунд.
pub const PRICES_CACHE_TTL_SECS: u64 = 15 * 60;

/// Время жизни кэша каталога, секунд.
pub const CATALOG_CACHE_TTL_SECS: u64 = 60 * 60;

/// Срок действия выданной сметы, дней.
pub const QUOTE_VALIDITY_DAYS: u32 = 30;

/// Ящик отдела продаж по умолчанию.
pub const DEFAULT_SALES_EMAIL: &str = "ventas@example.com";

/// Таймаут ожидания событий диспетчером, мс.
pub const CHANNEL_TIMEOUT_MS: u64 = 200;

/// Приветствие сервера.
pub const WELCOME_SERVER: &str = "Quote Server: сметы строительства и солнечных станций\n";

/// Описание команд.
pub const WELCOME_INFO: &str = "Команды: CONSTRUCTION <json> | SOLAR <json> | ESTIMATE <json> | PRICES | QUIT\n";

/// Завершение приветствия: после этой строки сервер принимает команды.
pub const WELCOME_TERMINATOR: &str = "READY\n";
