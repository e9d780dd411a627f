//! Поставщик прайс-листа и каталога.
//!
//! Данные запрашиваются у источника в отдельном потоке и ожидаются не дольше
//! заданного времени. Одновременно выполняется не больше одного запроса:
//! пока источник не ответил, новые не отправляются. Удачный ответ
//! кэшируется на время TTL, в том числе пришедший после таймаута. Если источник
//! недоступен, отдаётся последнее удачное значение, а при его отсутствии
//! встроенные данные. Калькулятор получает готовый снимок и не знает,
//! откуда он взят.

use calculator::{Catalog, PriceTable};
use commons::errors::QuoteError;
use crossbeam_channel::{RecvTimeoutError, bounded};
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Источник данных (файл, внешний сервис).
pub trait Source<T>: Send + Sync + 'static {
    /// Название источника для логов.
    fn name(&self) -> String;
    /// Получить свежие данные.
    fn fetch(&self) -> Result<T, QuoteError>;
}

/// Данные, которые может отдавать поставщик.
pub trait Snapshot: Clone + Send + 'static {
    /// Встроенное значение на случай недоступности источника.
    fn fallback() -> Self;

    /// Проверка полученных данных перед помещением в кэш.
    fn check(&self) -> Result<(), QuoteError> {
        Ok(())
    }
}

impl Snapshot for PriceTable {
    fn fallback() -> Self {
        PriceTable::fallback()
    }

    fn check(&self) -> Result<(), QuoteError> {
        self.validate()
    }
}

impl Snapshot for Catalog {
    fn fallback() -> Self {
        Catalog::fallback()
    }

    fn check(&self) -> Result<(), QuoteError> {
        self.validate()
    }
}

/// JSON-файл как источник данных.
pub struct JsonFileSource<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + 'static> Source<T> for JsonFileSource<T> {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<T, QuoteError> {
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            QuoteError::upstream(format!("чтение {}: {err}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            QuoteError::upstream(format!("разбор {}: {err}", self.path.display()))
        })
    }
}

/// Кэшированное значение и момент его получения.
#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

type Cache<T> = Arc<Mutex<Option<Cached<T>>>>;

/// Снимает признак выполняющегося запроса при завершении потока,
/// в том числе аварийном.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Поставщик данных с кэшем, ограничением времени ожидания и резервом.
pub struct PriceProvider<T: Snapshot> {
    source: Arc<dyn Source<T>>,
    ttl: Duration,
    timeout: Duration,
    cache: Cache<T>,
    fetching: Arc<AtomicBool>,
}

impl<T: Snapshot> PriceProvider<T> {
    /// ## Args
    ///
    /// - `source`: источник данных
    /// - `ttl`: время жизни удачного ответа в кэше
    /// - `timeout`: предельное время ожидания источника
    pub fn new(source: impl Source<T>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            ttl,
            timeout,
            cache: Arc::new(Mutex::new(None)),
            fetching: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Актуальный снимок данных. Никогда не завершается ошибкой.
    pub fn current(&self) -> T {
        let cached = self.cached();

        if let Some(entry) = &cached
            && entry.fetched_at.elapsed() < self.ttl
        {
            return entry.value.clone();
        }

        match self.fetch_bounded() {
            Ok(value) => {
                info!("Данные обновлены из источника {}", self.source.name());
                value
            }
            Err(err) => match cached {
                Some(entry) => {
                    warn!("Источник {} недоступен, используется кэш: {err}", self.source.name());
                    entry.value
                }
                None => {
                    warn!(
                        "Источник {} недоступен, используются встроенные данные: {err}",
                        self.source.name()
                    );
                    T::fallback()
                }
            },
        }
    }

    /// Запрос к источнику в отдельном потоке с ограничением ожидания.
    ///
    /// Зависший источник не блокирует расчёт. Поток сам помещает удачный
    /// ответ в кэш, даже если ожидание уже прекращено. Пока он не завершён,
    /// новый запрос не отправляется.
    fn fetch_bounded(&self) -> Result<T, QuoteError> {
        if self.fetching.swap(true, Ordering::SeqCst) {
            return Err(QuoteError::upstream(format!(
                "{} ещё не ответил на предыдущий запрос",
                self.source.name()
            )));
        }

        let (tx, rx) = bounded(1);
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let in_flight = InFlight(Arc::clone(&self.fetching));

        thread::spawn(move || {
            let result = source.fetch().and_then(|value| value.check().map(|_| value));
            if let Ok(value) = &result {
                store(&cache, value.clone());
            }
            drop(in_flight);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(QuoteError::upstream(format!(
                "{} не ответил за {} мс",
                self.source.name(),
                self.timeout.as_millis()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(QuoteError::upstream(format!(
                "поток чтения {} завершился аварийно",
                self.source.name()
            ))),
        }
    }

    fn cached(&self) -> Option<Cached<T>> {
        match self.cache.lock() {
            Ok(cache) => cache.clone(),
            Err(err) => {
                warn!("Кэш поставщика недоступен: {}", QuoteError::from(err));
                None
            }
        }
    }

}

fn store<T>(cache: &Mutex<Option<Cached<T>>>, value: T) {
    match cache.lock() {
        Ok(mut cache) => {
            *cache = Some(Cached {
                value,
                fetched_at: Instant::now(),
            })
        }
        Err(err) => warn!("Кэш поставщика недоступен: {}", QuoteError::from(err)),
    }
}
