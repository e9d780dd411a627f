//! Генерация случайных идентификаторов смет.

use rand::prelude::*;

/// Длина идентификатора сметы в шестнадцатеричных символах.
pub const QUOTE_ID_LEN: usize = 12;

/// Сгенерировать случайный идентификатор сметы, например `3f9a0c7b12de`.
///
/// ## Пример
///
/// ```
/// use commons::randomizer::{random_quote_id, QUOTE_ID_LEN};
///
/// let id = random_quote_id();
/// assert_eq!(id.len(), QUOTE_ID_LEN);
/// ```
pub fn random_quote_id() -> String {
    let mut rng = rand::rng();
    let value: u64 = rng.random();
    let hex = format!("{:016x}", value);
    hex[..QUOTE_ID_LEN].to_string()
}
