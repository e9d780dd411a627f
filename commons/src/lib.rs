//! Общие компоненты калькулятора смет: ошибки, модели запросов и результатов,
//! запись заявки, утилиты и фабрика логгеров.

use log::*;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode, WriteLogger};
use std::fs;
use std::fs::File;
use std::path::PathBuf;

pub mod errors;
pub mod lead;
pub mod models;
pub mod randomizer;
pub mod traits;
pub mod utils;

/// Фабрика по созданию индивидуальных логгеров для приложений.
///
/// Инициализация требуется один раз при запуске приложения. Далее используются
/// стандартные макросы [`log::info`], [`log::warn`], [`log::error`] для
/// логирования событий. В файл пишутся события уровня `Info` и выше,
/// в `stderr` дублируются предупреждения и ошибки.
///
/// ## Args
///
/// - `app_name`: название приложения (будет использовано для создания файла)
/// - `log_dir`: путь к директории расположения log-файлов (при отсутствии
///   пытается создать)
///
/// ## Пример
///
/// ```no_run
/// use log::*;
/// use commons::init_simple_logger;
/// use commons::utils::get_workspace_root;
///
/// let log_dir = get_workspace_root().join("log");
/// init_simple_logger("app_name", log_dir);
///
/// info!("Смета рассчитана");
/// warn!("Прайс-лист устарел, используется резервный");
/// ```
///
/// ## Паника
///
/// Паникует при ошибке создания (открытия) директории и (или) log-файла,
/// и при инициализации логгера (предоставляет сообщение о причинах, если
/// есть).
pub fn init_simple_logger(app_name: &str, log_dir: PathBuf) {
    let log_file_path = log_dir.join(format!("{}.log", app_name));

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .unwrap_or_else(|_| panic!("Не удалось сформировать путь: {}", log_dir.display()));
    }

    let log_file = File::create(&log_file_path)
        .unwrap_or_else(|_| panic!("Ошибка работы с log-файлом: {}", log_file_path.display()));

    let file_logger = WriteLogger::new(LevelFilter::Info, Config::default(), log_file);
    let term_logger = TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    CombinedLogger::init(vec![file_logger, term_logger])
        .unwrap_or_else(|e| panic!("Ошибка инициализации логгера: {e}"));
}
