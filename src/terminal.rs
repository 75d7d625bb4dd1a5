//! Interactive terminal client
//!
//! Menu-driven front end: public chat, private chat, rename, quit. It only
//! turns local input into protocol lines; server replies are copied to the
//! terminal by a separate task in the client binary.

use futures_util::SinkExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::debug;

use crate::error::AppError;
use crate::message::ClientRequest;

/// Input that leaves the current prompt loop
pub const EXIT: &str = "exit";

const MENU: &str = "1. public chat\n2. private chat\n3. change name\n0. quit\n";

/// Top-level menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Quit,
    PublicChat,
    PrivateChat,
    Rename,
}

impl MenuChoice {
    /// Parse a menu selection, `None` if out of range
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().parse::<u8>().ok()? {
            0 => Some(MenuChoice::Quit),
            1 => Some(MenuChoice::PublicChat),
            2 => Some(MenuChoice::PrivateChat),
            3 => Some(MenuChoice::Rename),
            _ => None,
        }
    }
}

/// Menu loop over an input line source, a server connection and a
/// terminal output
pub struct TerminalClient<I, W, O> {
    input: Lines<I>,
    conn: FramedWrite<W, LinesCodec>,
    out: O,
}

impl<I, W, O> TerminalClient<I, W, O>
where
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
{
    pub fn new(input: I, conn: W, out: O) -> Self {
        Self {
            input: input.lines(),
            conn: FramedWrite::new(conn, LinesCodec::new()),
            out,
        }
    }

    /// Run the menu until the user quits or input ends
    pub async fn run(&mut self) -> Result<(), AppError> {
        loop {
            self.print(MENU).await?;
            let Some(line) = self.read_line().await? else {
                return Ok(());
            };

            let Some(choice) = MenuChoice::parse(&line) else {
                self.print(">>>> please enter a number in range <<<<\n").await?;
                continue;
            };

            debug!("Menu choice: {:?}", choice);
            match choice {
                MenuChoice::Quit => return Ok(()),
                MenuChoice::PublicChat => self.public_chat().await?,
                MenuChoice::PrivateChat => self.private_chat().await?,
                MenuChoice::Rename => self.rename().await?,
            }
        }
    }

    /// Send every non-empty line as public chat until `exit`
    pub async fn public_chat(&mut self) -> Result<(), AppError> {
        loop {
            self.print(">>>>> enter message (exit to leave):\n").await?;
            let text = match self.read_line().await? {
                Some(text) if text != EXIT => text,
                _ => return Ok(()),
            };
            if !text.is_empty() {
                self.send(ClientRequest::Public { text }).await?;
            }
        }
    }

    /// List users, pick a target, send directed messages until `exit`
    pub async fn private_chat(&mut self) -> Result<(), AppError> {
        loop {
            self.send(ClientRequest::Who).await?;
            self.print(">>>>> enter recipient name (exit to leave):\n").await?;
            let target = match self.read_line().await? {
                Some(target) if target != EXIT => target,
                _ => return Ok(()),
            };

            loop {
                self.print(">>>>> enter message (exit to leave):\n").await?;
                let body = match self.read_line().await? {
                    Some(body) if body != EXIT => body,
                    Some(_) => break,
                    None => return Ok(()),
                };
                if !body.is_empty() {
                    self.send(ClientRequest::DirectMessage {
                        target: target.clone(),
                        body,
                    })
                    .await?;
                }
            }
        }
    }

    /// Ask for a new name and request it
    pub async fn rename(&mut self) -> Result<(), AppError> {
        self.print(">>>>> enter new name (exit to leave):\n").await?;
        match self.read_line().await? {
            Some(name) if name != EXIT => self.send(ClientRequest::Rename { name }).await,
            _ => Ok(()),
        }
    }

    async fn send(&mut self, request: ClientRequest) -> Result<(), AppError> {
        self.conn.send(request.to_line()).await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, AppError> {
        Ok(self
            .input
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn print(&mut self, text: &str) -> Result<(), AppError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_with(input: &str) -> (String, String) {
        let mut client = TerminalClient::new(input.as_bytes(), Vec::new(), Vec::new());
        client.run().await.unwrap();
        let sent = String::from_utf8(client.conn.get_ref().clone()).unwrap();
        let shown = String::from_utf8(client.out.clone()).unwrap();
        (sent, shown)
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::PublicChat));
        assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::PrivateChat));
        assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Rename));
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Quit));
        assert_eq!(MenuChoice::parse("4"), None);
        assert_eq!(MenuChoice::parse("abc"), None);
    }

    #[tokio::test]
    async fn test_public_chat_skips_empty_lines() {
        let (sent, _) = run_with("1\nhello\n\nworld\nexit\n0\n").await;
        assert_eq!(sent, "hello\nworld\n");
    }

    #[tokio::test]
    async fn test_private_chat_queries_directory_first() {
        let (sent, _) = run_with("2\nbob\nhi\nhow|are you\nexit\nexit\n0\n").await;
        assert_eq!(sent, "who\nto|bob|hi\nto|bob|how|are you\nwho\n");
    }

    #[tokio::test]
    async fn test_rename_sends_request_unless_exit() {
        let (sent, _) = run_with("3\nalice\n3\nexit\n0\n").await;
        assert_eq!(sent, "rename|alice\n");
    }

    #[tokio::test]
    async fn test_invalid_choice_reprompts() {
        let (sent, shown) = run_with("9\n0\n").await;
        assert!(sent.is_empty());
        assert!(shown.contains("please enter a number in range"));
        assert_eq!(shown.matches("0. quit").count(), 2);
    }

    #[tokio::test]
    async fn test_input_end_quits() {
        let (sent, _) = run_with("1\nbye").await;
        assert_eq!(sent, "bye\n");
    }
}
