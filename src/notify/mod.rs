//! 运营通知。
//!
//! 扫描循环只依赖 `Notify`：发送失败只记录日志，从不向调用方返回错误。

pub mod telegram;

pub use telegram::TelegramNotifier;

pub trait Notify {
    fn send(&self, message: &str);
}
