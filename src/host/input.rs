use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{anyhow, Context, Result};
use enigo::{Button, Direction, Enigo, Mouse, Settings};
use log::{error, info};

use super::{InputDriver, PointerButton};

enum InputCommand {
    Click {
        button: PointerButton,
        reply: Sender<Result<(), String>>,
    },
    Shutdown,
}

/// Mouse input through enigo. `Enigo` is not `Send` on every platform, so a
/// dedicated thread owns it and receives clicks over a channel. Each click
/// waits for the thread's answer so injection failures reach the caller.
pub struct EnigoInput {
    tx: Sender<InputCommand>,
}

impl EnigoInput {
    pub fn new() -> Result<Self> {
        Self::spawn(|| match Enigo::new(&Settings::default()) {
            Ok(mut enigo) => Ok(move |button: PointerButton| {
                click(&mut enigo, to_enigo(button)).map_err(|err| err.to_string())
            }),
            Err(err) => Err(err.to_string()),
        })
    }

    /// Starts the driver thread. `init` runs on that thread and builds the
    /// click handler, so the handler itself never has to be `Send`.
    fn spawn<I, F>(init: I) -> Result<Self>
    where
        I: FnOnce() -> Result<F, String> + Send + 'static,
        F: FnMut(PointerButton) -> Result<(), String>,
    {
        let (tx, rx) = mpsc::channel::<InputCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("input-driver".to_string())
            .spawn(move || {
                let mut handler = match init() {
                    Ok(handler) => {
                        let _ = ready_tx.send(Ok(()));
                        handler
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Ok(command) = rx.recv() {
                    match command {
                        InputCommand::Click { button, reply } => {
                            let result = handler(button);
                            if let Err(err) = &result {
                                error!("failed to click {button:?}: {err}");
                            }
                            let _ = reply.send(result);
                        }
                        InputCommand::Shutdown => break,
                    }
                }
                info!("input driver thread exiting");
            })
            .context("failed to spawn input driver thread")?;

        ready_rx
            .recv()
            .context("input driver thread exited during startup")?
            .map_err(|err| anyhow!("failed to initialize input engine: {err}"))?;

        Ok(Self { tx })
    }
}

impl InputDriver for EnigoInput {
    fn press_and_release(&self, button: PointerButton) -> Result<()> {
        let (reply, answer) = mpsc::channel();
        self.tx
            .send(InputCommand::Click { button, reply })
            .map_err(|_| anyhow!("input driver thread is gone"))?;
        answer
            .recv()
            .map_err(|_| anyhow!("input driver thread is gone"))?
            .map_err(|err| anyhow!("failed to click {button:?}: {err}"))
    }
}

impl Drop for EnigoInput {
    fn drop(&mut self) {
        let _ = self.tx.send(InputCommand::Shutdown);
    }
}

fn click(enigo: &mut Enigo, button: Button) -> Result<(), enigo::InputError> {
    enigo.button(button, Direction::Press)?;
    enigo.button(button, Direction::Release)
}

fn to_enigo(button: PointerButton) -> Button {
    match button {
        PointerButton::Left => Button::Left,
        PointerButton::Right => Button::Right,
        PointerButton::Middle => Button::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn clicks_reach_the_driver_thread() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let input = EnigoInput::spawn(move || {
            Ok(move |button: PointerButton| {
                recorder.lock().unwrap().push(button);
                Ok(())
            })
        })
        .unwrap();

        input.press_and_release(PointerButton::Right).unwrap();
        input.press_and_release(PointerButton::Left).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![PointerButton::Right, PointerButton::Left]
        );
    }

    #[test]
    fn failed_click_is_returned_to_the_caller() {
        let input = EnigoInput::spawn(|| {
            Ok(|_button: PointerButton| Err("display connection lost".to_string()))
        })
        .unwrap();

        let err = input.press_and_release(PointerButton::Right).unwrap_err();
        assert!(err.to_string().contains("display connection lost"));
    }

    #[test]
    fn startup_failure_is_reported() {
        let result = EnigoInput::spawn(|| {
            Err::<fn(PointerButton) -> Result<(), String>, _>("no display".to_string())
        });
        let err = result.err().unwrap();
        assert!(err.to_string().contains("no display"));
    }
}
