//! Фоновая обработка выданных смет: сохранение заявки и рассылка писем.
//!
//! Клиент получает ответ сразу после расчёта. Ошибки хранилища и почты
//! только записываются в лог.

use crate::config::CHANNEL_TIMEOUT_MS;
use crate::models::QuoteEvent;
use crate::notify::Notifier;
use crate::persistence::LeadStore;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Передать событие диспетчеру, не блокируя ответ клиенту.
pub fn publish(tx: &Sender<QuoteEvent>, event: QuoteEvent) {
    let quote_id = event.quote_id().to_string();
    if tx.send(event).is_err() {
        error!("Диспетчер смет остановлен, смета {quote_id} не будет сохранена");
    }
}

/// Диспетчер событий выдачи смет.
///
/// ## Args
///
/// - `events`: канал событий от обработчиков клиентов
/// - `store`: хранилище заявок
/// - `notifier`: отправитель писем
/// - `sales_email`: ящик отдела продаж
/// - `stop`: прерывание работы диспетчера внешней командой
///
/// После остановки обрабатывает события, уже находящиеся в канале.
pub fn quote_events_dispatcher(
    events: Receiver<QuoteEvent>,
    mut store: Box<dyn LeadStore>,
    mut notifier: Box<dyn Notifier>,
    sales_email: String,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Диспетчер смет запущен");

        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }

            match events.recv_timeout(Duration::from_millis(CHANNEL_TIMEOUT_MS)) {
                Ok(event) => {
                    process_event(&event, store.as_mut(), notifier.as_mut(), &sales_email)
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for event in events.try_iter() {
            process_event(&event, store.as_mut(), notifier.as_mut(), &sales_email);
        }

        info!("Диспетчер смет остановлен");
    })
}

/// Сохранить заявку и разослать письма по одной смете.
fn process_event(
    event: &QuoteEvent,
    store: &mut dyn LeadStore,
    notifier: &mut dyn Notifier,
    sales_email: &str,
) {
    let quote_id = event.quote_id();

    match store.save(&event.lead()) {
        Ok(()) => info!("Заявка {quote_id} сохранена"),
        Err(err) => warn!("Заявка {quote_id} не сохранена: {err}"),
    }

    let mails = match event.mails(sales_email) {
        Ok(mails) => mails,
        Err(err) => {
            warn!("Письма по смете {quote_id} не сформированы: {err}");
            return;
        }
    };

    for mail in mails {
        match notifier.send(&mail) {
            Ok(()) => info!("Письмо по смете {quote_id} для {} передано", mail.to),
            Err(err) => warn!("Письмо по смете {quote_id} для {} не отправлено: {err}", mail.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MailMessage;
    use calculator::{PriceTable, compute_construction_breakdown};
    use commons::errors::QuoteError;
    use commons::lead::LeadRecord;
    use commons::models::{
        ConstructionQuoteRequest, ConstructionSystem, CustomerContact, FinishLevel, IssuedQuote,
        UsageType,
    };
    use crossbeam_channel::unbounded;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryStore {
        leads: Arc<Mutex<Vec<LeadRecord>>>,
        failing: bool,
    }

    impl LeadStore for MemoryStore {
        fn save(&mut self, lead: &LeadRecord) -> Result<(), QuoteError> {
            if self.failing {
                return Err(QuoteError::storage_err("crm down"));
            }
            self.leads.lock()?.push(lead.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryNotifier {
        sent: Arc<Mutex<Vec<MailMessage>>>,
    }

    impl Notifier for MemoryNotifier {
        fn send(&mut self, message: &MailMessage) -> Result<(), QuoteError> {
            self.sent.lock()?.push(message.clone());
            Ok(())
        }
    }

    fn event() -> QuoteEvent {
        let request = ConstructionQuoteRequest {
            system: ConstructionSystem::Container,
            usage: UsageType::Commercial,
            finish: FinishLevel::Standard,
            area_m2: 30.0,
            province: "cordoba".to_string(),
            floors: 1,
            has_terrace: false,
            has_basement: false,
            utilities_included: true,
            customer: Some(CustomerContact {
                name: "Juan".to_string(),
                email: Some("juan@example.com".to_string()),
                phone: None,
            }),
        };
        QuoteEvent::Construction(IssuedQuote {
            quote_id: "00000000beef".to_string(),
            issued_at: 1_760_000_000,
            valid_until: 1_762_592_000,
            result: compute_construction_breakdown(&request, &PriceTable::fallback()).unwrap(),
        })
    }

    #[test]
    fn stores_lead_and_sends_mails() {
        let store = MemoryStore::default();
        let notifier = MemoryNotifier::default();
        let leads = Arc::clone(&store.leads);
        let sent = Arc::clone(&notifier.sent);

        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let handle = quote_events_dispatcher(
            rx,
            Box::new(store),
            Box::new(notifier),
            "ventas@example.com".to_string(),
            Arc::clone(&stop),
        );

        publish(&tx, event());
        drop(tx);
        handle.join().unwrap();

        let leads = leads.lock().unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].quote_id, "00000000beef");
        assert_eq!(leads[0].name, "Juan");

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "juan@example.com");
        assert_eq!(sent[1].to, "ventas@example.com");
    }

    #[test]
    fn storage_failure_does_not_block_mails() {
        let store = MemoryStore {
            failing: true,
            ..Default::default()
        };
        let notifier = MemoryNotifier::default();
        let sent = Arc::clone(&notifier.sent);

        let (tx, rx) = unbounded();
        let handle = quote_events_dispatcher(
            rx,
            Box::new(store),
            Box::new(notifier),
            "ventas@example.com".to_string(),
            Arc::new(AtomicBool::new(false)),
        );

        publish(&tx, event());
        drop(tx);
        handle.join().unwrap();

        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn stop_flag_drains_queue() {
        let store = MemoryStore::default();
        let leads = Arc::clone(&store.leads);

        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(true));
        publish(&tx, event());
        publish(&tx, event());

        let handle = quote_events_dispatcher(
            rx,
            Box::new(store),
            Box::new(MemoryNotifier::default()),
            "ventas@example.com".to_string(),
            stop,
        );
        handle.join().unwrap();

        assert_eq!(leads.lock().unwrap().len(), 2);
    }

    #[test]
    fn publish_after_shutdown_is_logged_only() {
        let (tx, rx) = unbounded();
        drop(rx);
        publish(&tx, event());
    }
}
