//! Ctrl+C 中断信号。
//!
//! 信号处理线程只负责投递消息，真正的退出流程由主循环在两次 tick 之间完成，
//! 正在进行的阻塞请求不会被打断。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

#[derive(Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
    requested: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Sender<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownTrigger {
    pub fn fire(&self) {
        self.requested.store(true, Ordering::SeqCst);
        let _ = self.tx.try_send(());
    }
}

impl ShutdownSignal {
    pub fn pair() -> (ShutdownTrigger, ShutdownSignal) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let requested = Arc::new(AtomicBool::new(false));
        (
            ShutdownTrigger {
                tx,
                requested: Arc::clone(&requested),
            },
            ShutdownSignal { rx, requested },
        )
    }

    /// 安装 Ctrl+C 处理器。进程内只能调用一次。
    pub fn install() -> Result<Self, ctrlc::Error> {
        let (trigger, signal) = Self::pair();
        ctrlc::set_handler(move || trigger.fire())?;
        Ok(signal)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// 最多等待 `timeout`；收到中断返回 true。
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) => self.is_requested(),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                self.is_requested()
            }
        }
    }
}
