//! TCP-сессия с Quote Server: приветствие, одна команда, ответ.

use crate::config::{CONNECT_TIMEOUT, READ_TIMEOUT, READY_MARKER};
use commons::errors::QuoteError;
use commons::traits::WriteExt;
use log::info;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};

/// Ответ сервера на команду.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `OK|<body>`.
    Ok(String),
    /// `ERROR|<message>`.
    Err(String),
}

impl Reply {
    /// Разобрать строку ответа сервера.
    pub fn parse(line: &str) -> Result<Self, QuoteError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (status, body) = line.split_once('|').unwrap_or((line, ""));

        match status {
            "OK" => Ok(Reply::Ok(body.to_string())),
            "ERROR" => Ok(Reply::Err(body.to_string())),
            _ => Err(QuoteError::command_err(format!(
                "неизвестный формат ответа: '{line}'"
            ))),
        }
    }
}

/// Пропустить приветствие сервера до строки [`READY_MARKER`].
fn wait_ready(reader: &mut impl BufRead) -> Result<(), QuoteError> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|err| QuoteError::upstream(format!("чтение приветствия: {err}")))?;
        if bytes == 0 {
            return Err(QuoteError::upstream(
                "сервер закрыл соединение до готовности",
            ));
        }
        if line.trim_end().eq_ignore_ascii_case(READY_MARKER) {
            return Ok(());
        }
    }
}

/// Выполнить одну команду в установленной сессии.
///
/// Отделено от сети для проверки на буферах в памяти.
fn exchange<R: Read, W: Write>(
    reader: &mut BufReader<R>,
    writer: &mut W,
    command: &str,
) -> Result<Reply, QuoteError> {
    wait_ready(reader)?;

    writer.write_line(command);

    let mut response = String::new();
    let bytes = reader
        .read_line(&mut response)
        .map_err(|err| QuoteError::upstream(format!("чтение ответа: {err}")))?;
    if bytes == 0 {
        return Err(QuoteError::upstream(
            "пустой ответ от сервера или сервер закрыл соединение",
        ));
    }

    let reply = Reply::parse(&response)?;
    writer.write_line("QUIT");
    Ok(reply)
}

/// Подключиться к серверу, отправить команду и получить ответ.
pub fn send_command(server_addr: SocketAddr, command: &str) -> Result<Reply, QuoteError> {
    let stream = TcpStream::connect_timeout(&server_addr, CONNECT_TIMEOUT).map_err(|err| {
        QuoteError::upstream(format!("подключение к {server_addr}: {err}"))
    })?;
    stream
        .set_read_timeout(Some(READ_TIMEOUT))
        .map_err(|err| QuoteError::upstream(format!("настройка соединения: {err}")))?;
    info!("Установлено соединение с сервером: {}", server_addr);

    let mut writer = stream
        .try_clone()
        .map_err(|err| QuoteError::upstream(format!("настройка соединения: {err}")))?;
    let mut reader = BufReader::new(stream);

    let reply = exchange(&mut reader, &mut writer, command)?;
    info!("Ответ сервера получен: {:?}", matches!(reply, Reply::Ok(_)));
    Ok(reply)
}
