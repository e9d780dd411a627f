//! Механизация TCP-сервера.
//!
//! Протокол строковый: одна команда в строке, один ответ в строке.
//!
//! ```text
//! CONSTRUCTION {"system":"steel_frame", ...}  -> OK|{"quote_id":...}
//! SOLAR {"monthly_consumption_kwh":300, ...}  -> OK|{"quote_id":...}
//! ESTIMATE {"monthly_consumption_kwh":300, ...} -> OK|{"required_power_kwp":...}
//! PRICES                                      -> OK|{"prices":...,"catalog":...}
//! QUIT                                        -> OK|bye
//! ```

use crate::channels::quote_events_dispatcher;
use crate::cli::ServerSet;
use crate::config::{
    CATALOG_CACHE_TTL_SECS, CATALOG_FILENAME, DATA_FOLDER, LEADS_FILENAME, OUTBOX_FOLDER,
    PRICES_CACHE_TTL_SECS, PRICES_FILENAME, QUOTE_VALIDITY_DAYS, WELCOME_INFO, WELCOME_SERVER,
    WELCOME_TERMINATOR,
};
use crate::notify::OutboxNotifier;
use crate::persistence::FileLeadStore;
use crate::provider::{JsonFileSource, PriceProvider};
use crate::service::QuoteService;
use calculator::{ConstructionCalculator, ConstructionSettings, SolarCalculator};
use commons::utils::get_workspace_root;
use commons::{errors::QuoteError, traits::WriteExt};
use crossbeam_channel::unbounded;
use log::{error, info, warn};
use macros::QuoteEnumDisplay;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::{
    fmt::Display,
    io,
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener, TcpStream},
    str::FromStr,
    thread::{sleep, spawn},
    time::Duration,
};

/// Тип ответа сервера клиенту.
enum ServerResponse {
    /// Успешное исполнение команды.
    Ok { message: Option<String> },
    /// Ошибка при выполнении команды.
    Err { message: Option<String> },
}

impl Display for ServerResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerResponse::Ok { message } => match message {
                Some(msg) => write!(f, "OK|{}", msg),
                None => write!(f, "OK"),
            },
            ServerResponse::Err { message } => match message {
                Some(msg) => write!(f, "ERROR|{}", msg),
                None => write!(f, "ERROR"),
            },
        }
    }
}

impl ServerResponse {
    /// Отправить ответ клиенту одной строкой.
    ///
    /// ## Args
    ///
    /// - `writer`: TCP-поток для записи ответа
    /// - `addr`: адрес TCP-сокета клиента
    /// - `log`: если `true`, ответ также записывается в лог-файл
    pub fn send(&self, writer: &mut TcpStream, addr: SocketAddr, log: bool) {
        let response = self.to_string();
        if log {
            info!("Ответ: {} для клиента {}", response, addr);
        }
        writer.write_line(&response);
    }

    /// Успешный ответ.
    pub fn ok(message: &str) -> Self {
        if message.trim().is_empty() {
            ServerResponse::Ok { message: None }
        } else {
            ServerResponse::Ok {
                message: Some(message.to_string()),
            }
        }
    }

    /// Ответ с ошибкой. Переводы строк заменяются пробелами.
    pub fn err(message: &str) -> Self {
        let message = message.replace(['\r', '\n'], " ");
        if message.trim().is_empty() {
            ServerResponse::Err { message: None }
        } else {
            ServerResponse::Err {
                message: Some(message),
            }
        }
    }
}

/// Команды клиента.
#[derive(Debug, Clone, Copy, PartialEq, QuoteEnumDisplay)]
enum Command {
    /// Смета строительства.
    #[str("construction", "construccion")]
    Construction,
    /// Проект солнечной станции.
    #[str("solar")]
    Solar,
    /// Быстрая оценка солнечной станции.
    #[str("estimate")]
    Estimate,
    /// Действующие прайс-лист и каталог.
    #[str("prices")]
    Prices,
    /// Завершить сессию.
    #[str("quit", "exit")]
    Quit,
}

/// Разделить строку на команду и JSON-тело.
fn split_command(input: &str) -> Result<(Command, &str), QuoteError> {
    let (name, payload) = input
        .split_once(char::is_whitespace)
        .unwrap_or((input, ""));
    let command = Command::from_str(name)
        .map_err(|_| QuoteError::command_err(format!("неизвестная команда '{name}'")))?;
    Ok((command, payload.trim()))
}

/// Выполнить команду. `None`, если клиент завершает сессию.
fn execute(service: &QuoteService, input: &str) -> Option<ServerResponse> {
    let (command, payload) = match split_command(input) {
        Ok(parts) => parts,
        Err(err) => return Some(ServerResponse::err(&err.to_string())),
    };

    let result = match command {
        Command::Construction => service.construction(payload),
        Command::Solar => service.solar(payload),
        Command::Estimate => service.estimate(payload),
        Command::Prices => service.prices(),
        Command::Quit => return None,
    };

    Some(match result {
        Ok(body) => ServerResponse::ok(&body),
        Err(err) => {
            if err.is_client_fault() {
                info!("Команда {command} отклонена: {err}");
            } else {
                error!("Ошибка выполнения команды {command}: {err}");
            }
            ServerResponse::err(&err.to_string())
        }
    })
}

/// Организатор работы TCP-сервера.
pub fn run_server(settings: ServerSet) -> io::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(io::Error::other)?;

    // Инициализация окружения.
    let data_dir = get_workspace_root().join(DATA_FOLDER);
    let (events_tx, events_rx) = unbounded();

    let stop_dispatcher = Arc::new(AtomicBool::new(false));
    let handle_dispatcher = quote_events_dispatcher(
        events_rx,
        Box::new(FileLeadStore::new(data_dir.join(LEADS_FILENAME))),
        Box::new(OutboxNotifier::new(data_dir.join(OUTBOX_FOLDER))),
        settings.sales_email.clone(),
        stop_dispatcher.clone(),
    );

    let service = Arc::new(QuoteService {
        construction: ConstructionCalculator::new(
            ConstructionSettings::default().with_max_area(settings.max_area_m2),
        ),
        solar: SolarCalculator::default(),
        prices: PriceProvider::new(
            JsonFileSource::new(data_dir.join(PRICES_FILENAME)),
            Duration::from_secs(PRICES_CACHE_TTL_SECS),
            settings.fetch_timeout,
        ),
        catalog: PriceProvider::new(
            JsonFileSource::new(data_dir.join(CATALOG_FILENAME)),
            Duration::from_secs(CATALOG_CACHE_TTL_SECS),
            settings.fetch_timeout,
        ),
        events: events_tx,
        validity_days: QUOTE_VALIDITY_DAYS,
    });

    // Запуск сервера.
    let listener = TcpListener::bind(settings.server_addr)?;
    listener.set_nonblocking(true)?;

    println!("Запущен сервер по адресу {}", settings.server_addr);
    println!("Завершить работу сервера с помощью CTRL-C/CTRL-BREAK.\n");
    info!("Quote Server запущен на {}", settings.server_addr);

    loop {
        if !running.load(Ordering::SeqCst) {
            info!("Работа сервера прервана...");
            break;
        }

        match listener.accept() {
            Ok((stream, addr)) => {
                info!("Рукопожатие: {:?}", addr);
                let service = Arc::clone(&service);
                spawn(move || {
                    if let Err(err) = handle_client(stream, addr, &service) {
                        warn!("Сессия клиента {} прервана: {}", addr, err);
                    }
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                sleep(Duration::from_millis(50));
            }
            Err(e) => {
                error!("Ошибка работы сервера: {}", e);
                break;
            }
        }
    }

    info!("Завершение работы...");

    // Остановка диспетчера: события из очереди будут обработаны.
    stop_dispatcher.store(true, Ordering::SeqCst);
    if let Err(err) = handle_dispatcher.join() {
        error!("Диспетчер смет завершился паникой: {:?}", err);
    }

    Ok(())
}

/// Взаимодействие с клиентом: приветствие, затем команды до `QUIT`
/// или закрытия соединения.
fn handle_client(stream: TcpStream, addr: SocketAddr, service: &QuoteService) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    writer.write_str(WELCOME_SERVER);
    writer.write_str(WELCOME_INFO);
    writer.write_str(WELCOME_TERMINATOR);

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {
                let input = line.trim();
                if input.is_empty() {
                    ServerResponse::err("empty line").send(&mut writer, addr, false);
                    continue;
                }

                match execute(service, input) {
                    Some(response) => response.send(&mut writer, addr, false),
                    None => {
                        ServerResponse::ok("bye").send(&mut writer, addr, false);
                        info!("Клиент {} завершил сессию", addr);
                        return Ok(());
                    }
                }
            }
            Err(err) => {
                error!("Ошибка чтения от {}: {}", addr, err);
                return Err(err);
            }
        }
    }
}
