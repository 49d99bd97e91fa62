//! Greeting written to every new connection before it picks a name.

use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const WELCOME: &str = "Welcome to TCP-Chat!\n";

pub const LOGO: &str = r#"         _nnnn_
        dGGGGMMb
       @p~qp~~qMb
       M|@||@) M|
       @,----.JM|
      JS^\__/  qKL
     dZP        qKRb
    dZP          qKKb
   fZP            SMMb
   HZM            MMMM
   FqM            MMMM
 __| ".        |\dS"qML
 |    `.       | `' \Zq
_)      \.___.,|     .'
\____   )MMMMMP|   .'
     `-'       `--'
"#;

pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]: ";

/// Write the welcome line, the logo and the name prompt
pub async fn write_greeting<W>(writer: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(WELCOME.as_bytes()).await?;
    writer.write_all(LOGO.as_bytes()).await?;
    writer.write_all(NAME_PROMPT.as_bytes()).await?;
    writer.flush().await
}
