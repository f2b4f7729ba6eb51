use bincode::{deserialize, serialize, ErrorKind};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{self, Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum allowed message size (1MB) to prevent unbounded allocation
/// from a hostile or broken peer.
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

fn check_len(len: usize) -> io::Result<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message size {len} exceeds maximum allowed size of {MAX_MESSAGE_SIZE} bytes"),
        ));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(buf: &[u8]) -> io::Result<T> {
    match deserialize(buf) {
        Ok(value) => Ok(value),
        Err(error) => match *error {
            ErrorKind::Io(error) => Err(error),
            _ => Err(io::ErrorKind::InvalidData.into()),
        },
    }
}

fn encode<T: Serialize>(value: &T) -> io::Result<Vec<u8>> {
    match serialize(value) {
        Ok(serialized) => {
            check_len(serialized.len())?;
            // Write the size prefix and payload as one chunk to prevent
            // read-side EOF races between the two.
            let size = serialized.len() as u32;
            let mut buf = Vec::from(size.to_le_bytes());
            buf.extend(serialized);
            Ok(buf)
        }
        Err(error) => match *error {
            ErrorKind::Io(error) => Err(error),
            _ => Err(io::ErrorKind::InvalidData.into()),
        },
    }
}

pub fn read_prefixed<T: DeserializeOwned, R: Read>(reader: &mut R) -> io::Result<T> {
    let mut len_bytes = [0; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    check_len(len)?;

    // A would-block here very likely means the sender doesn't follow the
    // prefix protocol; surface it as invalid data so readers can decide
    // how to treat such senders.
    let mut buf = vec![0; len];
    if let Err(error) = reader.read_exact(&mut buf) {
        let kind = match error.kind() {
            io::ErrorKind::WouldBlock => io::ErrorKind::InvalidData,
            kind => kind,
        };
        return Err(kind.into());
    }
    decode(&buf)
}

pub fn write_prefixed<T: Serialize, W: Write>(writer: &mut W, value: &T) -> io::Result<()> {
    let buf = encode(value)?;
    writer.write_all(&buf)?;
    Ok(())
}

pub async fn read_prefixed_async<T, R>(reader: &mut R) -> io::Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    check_len(len)?;

    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await?;
    decode(&buf)
}

pub async fn write_prefixed_async<T, W>(writer: &mut W, value: &T) -> io::Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let buf = encode(value)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        net::{TcpListener, TcpStream},
    };

    use super::{read_prefixed, read_prefixed_async, write_prefixed, write_prefixed_async};

    fn setup() -> (TcpStream, TcpStream) {
        let server = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (stream, _) = server.accept().unwrap();
        (client, stream)
    }

    #[test]
    fn write_and_read() {
        let (mut client, mut stream) = setup();
        let value = "Hello, World!".to_string();
        assert!(write_prefixed(&mut stream, &value).is_ok());
        assert!(read_prefixed::<String, TcpStream>(&mut client).is_ok_and(|v| v == value));
    }

    #[test]
    fn write_and_read_unexpected_eof() {
        let (mut client, mut stream) = setup();
        let value = "Hello, World!".to_string();
        let buf = value.as_bytes();
        let incorrect_size = buf.len() as u32 - 2;
        assert!(stream.write_all(&incorrect_size.to_le_bytes()).is_ok());
        assert!(stream.write_all(buf).is_ok());
        assert_eq!(
            read_prefixed::<String, TcpStream>(&mut client).map_err(|e| e.kind()),
            Err(io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn reject_oversized_message() {
        let (mut client, mut stream) = setup();

        // A prefix claiming 2GB of data must be refused before any
        // allocation happens.
        let malicious_size = 2_000_000_000u32;
        assert!(stream.write_all(&malicious_size.to_le_bytes()).is_ok());
        assert_eq!(
            read_prefixed::<String, TcpStream>(&mut client).map_err(|e| e.kind()),
            Err(io::ErrorKind::InvalidData)
        );
    }

    #[test]
    fn write_and_read_multiple_messages() {
        let (mut client, mut stream) = setup();
        let msgs = ["first", "second", "third"];
        for msg in &msgs {
            assert!(write_prefixed(&mut stream, &msg.to_string()).is_ok());
        }
        for msg in &msgs {
            let received: String = read_prefixed(&mut client).unwrap();
            assert_eq!(&received, msg);
        }
    }

    #[test]
    fn read_prefixed_with_partial_length() {
        let (mut client, mut stream) = setup();
        assert!(stream.write_all(&[0, 0]).is_ok());
        drop(stream);
        assert_eq!(
            read_prefixed::<String, TcpStream>(&mut client).map_err(|e| e.kind()),
            Err(io::ErrorKind::UnexpectedEof)
        );
    }

    #[tokio::test]
    async fn async_write_and_read() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let value = vec![1u32, 2, 3];
        write_prefixed_async(&mut a, &value).await.unwrap();
        let received: Vec<u32> = read_prefixed_async(&mut b).await.unwrap();
        assert_eq!(received, value);
    }

    #[tokio::test]
    async fn async_and_blocking_framing_agree() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        // Frame with the blocking writer, read with the async reader.
        let mut framed = Vec::new();
        write_prefixed(&mut framed, &"ping".to_string()).unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut a, &framed)
            .await
            .unwrap();
        let received: String = read_prefixed_async(&mut b).await.unwrap();
        assert_eq!(received, "ping");
    }

    #[tokio::test]
    async fn async_reject_oversized_message() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        tokio::io::AsyncWriteExt::write_all(&mut a, &2_000_000_000u32.to_le_bytes())
            .await
            .unwrap();
        assert_eq!(
            read_prefixed_async::<String, _>(&mut b)
                .await
                .map_err(|e| e.kind()),
            Err(io::ErrorKind::InvalidData)
        );
    }
}
