//! Terminal stand-in for a chat message with an inline keyboard

use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;
use keygrid_lib::error::HostError;
use keygrid_lib::host::Answer;
use keygrid_lib::host::CallbackContext;
use keygrid_lib::keyboard::Keyboard;

/// A message shown on stdout whose keyboard can be edited or removed.
#[derive(Debug)]
pub struct ConsoleContext {
    keyboard: Mutex<Option<Keyboard>>,
}

impl ConsoleContext {
    pub fn new(keyboard: Keyboard) -> Self {
        Self {
            keyboard: Mutex::new(Some(keyboard)),
        }
    }

    /// Returns the keyboard currently attached to the message.
    pub fn keyboard(&self) -> Option<Keyboard> {
        self.keyboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CallbackContext for ConsoleContext {
    async fn answer(&self, answer: Answer) -> Result<(), HostError> {
        log::debug!("answer {:?}", answer);
        match answer.text {
            Some(text) if answer.show_alert => println!("[alert] {text}"),
            Some(text) => println!("[toast] {text}"),
            None => {}
        }
        Ok(())
    }

    async fn edit_markup(&self, keyboard: Keyboard) -> Result<(), HostError> {
        let mut current = self.keyboard.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_none() {
            return Err(HostError::MessageNotFound);
        }
        if current.as_ref() == Some(&keyboard) {
            return Err(HostError::NotModified);
        }
        *current = Some(keyboard);
        Ok(())
    }

    async fn remove_markup(&self) -> Result<(), HostError> {
        match self.keyboard.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(_) => Ok(()),
            None => Err(HostError::NotModified),
        }
    }

    async fn edit_text(&self, text: &str) -> Result<(), HostError> {
        println!("> {text}");
        Ok(())
    }
}

/// Prints `keyboard` with every button numbered from 1.
pub fn print_keyboard(keyboard: &Keyboard) {
    let mut n = 0;
    for row in keyboard.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|button| {
                n += 1;
                format!("[{n:>2}] {}", button.text)
            })
            .collect();
        println!("  {}", cells.join("  "));
    }
}
