//! Обработка аргументов командной строки при запуске приложения.
//!
//! Пользователь указывает адрес сервера и одну из команд: смета
//! строительства, проект солнечной станции, быстрая оценка или прайс-лист.
//!
//! ```text
//! $ qclient construction --system steel_frame --area 100 --province mendoza
//! $ qclient solar --consumption 300 --area 40 --battery --email ana@example.com
//! ```

use crate::config::*;
use clap::{Args, Parser, Subcommand};
use commons::errors::QuoteError;
use commons::models::{
    ConstructionQuoteRequest, ConstructionSystem, CustomerContact, FinishLevel,
    InstallationType, InverterType, PanelType, SolarQuoteRequest, TariffCategory, UsageType,
};
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::ops::RangeInclusive;

#[derive(Debug, Parser)]
#[command(about = "Quote Client. Construction and solar installation quotes.")]
#[command(author, version, long_about = None)]
struct CliArgs {
    /// TCP server socket address.
    #[arg(short, long, required = false, default_value_t = DEFAULT_SERVER_SOCKET)]
    socket: Ipv4Addr,

    /// TCP server port (for example 8888).
    #[arg(short, long, required = false, default_value_t = DEFAULT_SERVER_PORT, value_parser=validate_tcp_port
    )]
    port: u16,

    /// Supported server commands.
    #[command(subcommand)]
    command: Commands,
}

/// Валидатор для полей `port` и аналогичных.
fn port_in_range(s: &str, range: RangeInclusive<u16>) -> Result<u16, String> {
    let port: u16 = s.parse().map_err(|_| format!("invalid port number: {s}"))?;
    if range.contains(&port) {
        Ok(port)
    } else {
        Err(format!(
            "port number {} not in range {}..{}",
            s,
            range.start(),
            range.end()
        ))
    }
}

/// Валидатор для поля `port`.
fn validate_tcp_port(s: &str) -> Result<u16, String> {
    port_in_range(s, ALLOW_TCP_PORTS)
}

/// Контактные данные клиента (необязательные).
#[derive(Debug, Args)]
struct ContactArgs {
    /// Customer name.
    #[arg(long)]
    name: Option<String>,
    /// Customer email: a copy of the quote is sent there.
    #[arg(long)]
    email: Option<String>,
    /// Customer phone.
    #[arg(long)]
    phone: Option<String>,
}

impl ContactArgs {
    fn contact(&self) -> Option<CustomerContact> {
        if self.name.is_none() && self.email.is_none() && self.phone.is_none() {
            return None;
        }
        Some(CustomerContact {
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        })
    }
}

/// Параметры солнечной станции, общие для `solar` и `estimate`.
#[derive(Debug, Args)]
struct SolarArgs {
    /// Monthly electricity consumption, kWh.
    #[arg(short, long)]
    consumption: f64,
    /// Area available for panels, m².
    #[arg(short, long)]
    area: f64,
    /// Tariff category: residential, commercial, industrial.
    #[arg(long, default_value = "residential")]
    tariff: TariffCategory,
    /// Installation type, e.g. roof_residential, ground_commercial, carport.
    #[arg(long, default_value = "roof_residential")]
    installation: InstallationType,
}

impl SolarArgs {
    fn request(&self) -> SolarQuoteRequest {
        SolarQuoteRequest {
            monthly_consumption_kwh: self.consumption,
            available_area_m2: self.area,
            tariff: self.tariff,
            installation: self.installation,
            location: None,
            battery_backup: false,
            battery_autonomy_hours: None,
            panel_preference: None,
            inverter_preference: None,
            customer: None,
        }
    }
}

/// Supported server commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Construction quote for a steel frame, industrial, container or mixed building.
    Construction {
        /// Construction system: steel_frame, industrial, container, mixed.
        #[arg(long)]
        system: ConstructionSystem,
        /// Building usage: residential, commercial, industrial.
        #[arg(long, default_value = "residential")]
        usage: UsageType,
        /// Finish level: basic, standard, premium.
        #[arg(long, default_value = "standard")]
        finish: FinishLevel,
        /// Built area, m².
        #[arg(short, long)]
        area: f64,
        /// Province code, e.g. buenos_aires, mendoza.
        #[arg(long)]
        province: String,
        /// Number of floors.
        #[arg(long, default_value_t = 1)]
        floors: u32,
        /// The building has a terrace.
        #[arg(long)]
        terrace: bool,
        /// The building has a basement.
        #[arg(long)]
        basement: bool,
        /// Exclude utilities from the quote.
        #[arg(long)]
        no_utilities: bool,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Solar installation design with equipment selection and payback.
    Solar {
        #[command(flatten)]
        solar: SolarArgs,
        /// Town or province of the installation.
        #[arg(long)]
        location: Option<String>,
        /// Add battery backup.
        #[arg(long)]
        battery: bool,
        /// Battery autonomy, hours.
        #[arg(long, requires = "battery")]
        autonomy: Option<u32>,
        /// Preferred panel technology.
        #[arg(long)]
        panel: Option<PanelType>,
        /// Preferred inverter type.
        #[arg(long)]
        inverter: Option<InverterType>,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Quick solar estimate without equipment selection.
    Estimate {
        #[command(flatten)]
        solar: SolarArgs,
    },
    /// Current price table and equipment catalog.
    Prices,
}

/// Вид запроса, определяющий формат вывода ответа.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Construction,
    Solar,
    Estimate,
    Prices,
}

/// Параметры, полученные из командной строки при запуске приложения.
pub struct ClientSet {
    /// Адрес TCP-сервера.
    pub server_addr: SocketAddr,
    /// Вид запроса.
    pub kind: RequestKind,
    /// Подготовленная команда для сервера.
    pub command: String,
}

impl Display for ClientSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "server: {} | request: {:?}", self.server_addr, self.kind)
    }
}

impl ClientSet {
    /// Сформировать экземпляр [`ClientSet`] на основе данных из командной
    /// строки.
    fn new(args: &CliArgs) -> Result<Self, QuoteError> {
        let (kind, command) = Self::command_line(&args.command)?;

        Ok(Self {
            server_addr: Self::make_server_addr(args.socket, args.port),
            kind,
            command,
        })
    }

    /// Сформировать адрес сокета TCP-сервера.
    fn make_server_addr(address: Ipv4Addr, port: u16) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(address, port))
    }

    /// Сформировать строку команды для сервера: имя команды и JSON-тело.
    fn command_line(command: &Commands) -> Result<(RequestKind, String), QuoteError> {
        match command {
            Commands::Construction {
                system,
                usage,
                finish,
                area,
                province,
                floors,
                terrace,
                basement,
                no_utilities,
                contact,
            } => {
                let request = ConstructionQuoteRequest {
                    system: *system,
                    usage: *usage,
                    finish: *finish,
                    area_m2: *area,
                    province: province.clone(),
                    floors: *floors,
                    has_terrace: *terrace,
                    has_basement: *basement,
                    utilities_included: !*no_utilities,
                    customer: contact.contact(),
                };
                Ok((
                    RequestKind::Construction,
                    format!("CONSTRUCTION {}", to_json(&request)?),
                ))
            }
            Commands::Solar {
                solar,
                location,
                battery,
                autonomy,
                panel,
                inverter,
                contact,
            } => {
                let request = SolarQuoteRequest {
                    location: location.clone(),
                    battery_backup: *battery,
                    battery_autonomy_hours: *autonomy,
                    panel_preference: *panel,
                    inverter_preference: *inverter,
                    customer: contact.contact(),
                    ..solar.request()
                };
                Ok((RequestKind::Solar, format!("SOLAR {}", to_json(&request)?)))
            }
            Commands::Estimate { solar } => Ok((
                RequestKind::Estimate,
                format!("ESTIMATE {}", to_json(&solar.request())?),
            )),
            Commands::Prices => Ok((RequestKind::Prices, "PRICES".to_string())),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, QuoteError> {
    serde_json::to_string(value)
        .map_err(|err| QuoteError::value_err(format!("сериализация запроса: {err}")))
}

/// Получить от пользователя первичные настройки приложения.
///
/// Гарантировано, что данные получены и проверены в доступных пределах
/// (но не гарантируется, что адрес ведёт к действующему серверу).
pub fn parse_cli_args() -> Result<ClientSet, QuoteError> {
    let args = CliArgs::parse();

    ClientSet::new(&args)
}
