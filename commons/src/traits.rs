//! Универсальные трейты для Quote Server и Quote Client.

use std::io::Write;

pub trait WriteExt {
    /// Отправляет в `Write` переданную текстовую строку, преобразуя её
    /// в байтовую.
    fn write_str(&mut self, s: impl AsRef<str>);
    /// Отправляет строку протокола, завершая её переводом строки.
    fn write_line(&mut self, s: impl AsRef<str>);
    /// Обёртка для `writer.flush()`, скрывающая обработку `Result`.
    fn flush_ext(&mut self);
}

impl<W: Write> WriteExt for W {
    fn write_str(&mut self, s: impl AsRef<str>) {
        let _ = self.write_all(s.as_ref().as_bytes());
        self.flush_ext()
    }

    fn write_line(&mut self, s: impl AsRef<str>) {
        let line = s.as_ref().trim_end_matches(['\r', '\n']);
        let _ = self.write_all(line.as_bytes());
        let _ = self.write_all(b"\n");
        self.flush_ext()
    }

    fn flush_ext(&mut self) {
        let _ = self.flush();
    }
}
