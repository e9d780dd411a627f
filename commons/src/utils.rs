//! Универсальные утилиты.

use std::path::PathBuf;
use std::time::SystemTime;

/// Количество секунд в сутках.
pub const SECS_PER_DAY: u64 = 86_400;

/// Возвращает количество секунд от начала эпохи UNIX, на основе системного
/// времени.
///
/// Время формата POSIX/UNIX: не включает високосные секунды, а каждый день
/// имеет равную длину в 86400 секунд.
///
/// Возможна паника, если системные часы выставлены на время ранее
/// 1 января 1970 года 0:00:00 UTC.
pub fn get_timestamp() -> u64 {
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(_) => panic!("Системное время раньше 01.01.1970 0:00:00 UTC"),
    }
}

/// Момент окончания срока действия: `issued_at` плюс `days` суток.
pub fn valid_until(issued_at: u64, days: u32) -> u64 {
    issued_at.saturating_add(u64::from(days) * SECS_PER_DAY)
}

/// Округлить значение до `digits` знаков после запятой (для отображения).
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Предоставить родительский каталог проекта.
///
/// Для `debug` это будет директория расположения `cargo.toml`, а для `release`
/// расположение скомпилированного файла.
#[cfg(debug_assertions)]
pub fn get_project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

#[cfg(not(debug_assertions))]
pub fn get_project_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .expect("Не удалось определить путь к исполняемому файлу")
}

/// Предоставить корневую директорию всего проекта.
///
/// В зависимости от статуса проекта предоставляет путь к корневой директории
/// `workspace`, а для `release` к месту расположения скомпилированного файла,
/// что также является корневым путём.
///
/// Вызывает панику при неудачах определения путей.
pub fn get_workspace_root() -> PathBuf {
    let project_root = get_project_root();
    if cfg!(debug_assertions) {
        project_root
            .parent()
            .expect("Не удалось получить родительский каталог workspace")
            .to_path_buf()
    } else {
        project_root.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_until_adds_days() {
        assert_eq!(valid_until(1_000, 30), 1_000 + 30 * SECS_PER_DAY);
    }

    #[test]
    fn valid_until_saturates() {
        assert_eq!(valid_until(u64::MAX - 1, 1), u64::MAX);
    }

    #[test]
    fn round_to_two_digits() {
        assert_eq!(round_to(2.138_986, 2), 2.14);
        assert_eq!(round_to(10_500.0, 2), 10_500.0);
    }

    #[test]
    fn timestamp_is_after_2020() {
        assert!(get_timestamp() > 1_577_836_800);
    }
}
