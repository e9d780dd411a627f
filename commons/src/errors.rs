//! Собственные типы ошибок приложения.
//!
//! Для поддержки функциональности применяется крейт `thiserror`.

use std::sync::PoisonError;
use thiserror::Error;

/// Дерево ошибок калькулятора смет и сопутствующих приложений.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Некорректные входные данные расчёта.
    ///
    /// Значение вне допустимого диапазона или отсутствует обязательное
    /// числовое/перечислимое поле. Запрос отклоняется целиком, частичного
    /// результата нет.
    #[error("некорректные входные данные: {0}")]
    InvalidInput(String),

    /// Поставщик цен или каталога оборудования недоступен.
    #[error("источник данных недоступен: {0}")]
    UpstreamUnavailable(String),

    /// Некорректное значение при разборе строки.
    ///
    /// Например, если ожидается `steel_frame`, а передано `wood`.
    #[error("неверное значение: {0}")]
    ValueError(String),

    /// Некорректная команда протокола.
    #[error("ошибка команды: {0}")]
    CommandError(String),

    /// Ошибка блокировки mutex.
    #[error("ошибка блокировки: {0}")]
    LockError(String),

    /// Ошибка сохранения заявки.
    #[error("ошибка хранилища: {0}")]
    StorageError(String),

    /// Ошибка отправки уведомления.
    #[error("ошибка уведомления: {0}")]
    NotifyError(String),
}

impl<T> From<PoisonError<T>> for QuoteError {
    fn from(err: PoisonError<T>) -> Self {
        QuoteError::LockError(err.to_string())
    }
}

impl QuoteError {
    /// Конструктор для ошибки [`QuoteError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> QuoteError {
        Self::InvalidInput(message.into())
    }

    /// Конструктор для ошибки [`QuoteError::UpstreamUnavailable`].
    pub fn upstream(message: impl Into<String>) -> QuoteError {
        Self::UpstreamUnavailable(message.into())
    }

    /// Конструктор для ошибки [`QuoteError::ValueError`].
    pub fn value_err(message: impl Into<String>) -> QuoteError {
        Self::ValueError(message.into())
    }

    /// Конструктор для ошибки [`QuoteError::CommandError`].
    pub fn command_err(message: impl Into<String>) -> QuoteError {
        Self::CommandError(message.into())
    }

    /// Конструктор для ошибки [`QuoteError::StorageError`].
    pub fn storage_err(message: impl Into<String>) -> QuoteError {
        Self::StorageError(message.into())
    }

    /// Конструктор для ошибки [`QuoteError::NotifyError`].
    pub fn notify_err(message: impl Into<String>) -> QuoteError {
        Self::NotifyError(message.into())
    }

    /// Ошибка вызвана данными клиента (а не окружением сервера).
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::ValueError(_) | Self::CommandError(_)
        )
    }
}
