//! Checked reads over a byte buffer. The stock `bytes::Buf` getters panic on
//! underflow; a truncated classfile must surface as an error instead.

use anyhow::{anyhow, Result};
use bytes::Bytes;

macro_rules! impl_safebuf {
    ( $($type:ty),* ) => {
        pub trait SafeBuf: bytes::Buf {
            paste::paste! {
                $(
                    fn [<try_get_ $type>](&mut self) -> anyhow::Result<$type> {
                        if self.remaining() >= std::mem::size_of::<$type>() {
                            Ok(self.[<get_ $type>]())
                        } else {
                            Err(anyhow!("unexpected end of class data"))
                        }
                    }
                )*
            }
        }

        impl<T: bytes::Buf> SafeBuf for T {}
    };
}

impl_safebuf!(u8, u16, u32);

/// Splits `count` bytes off the front of `bytes`, checked.
pub fn try_split(bytes: &mut Bytes, count: usize) -> Result<Bytes> {
    if bytes.len() < count {
        return Err(anyhow!(
            "unexpected end of class data (wanted {} bytes, had {})",
            count,
            bytes.len()
        ));
    }

    Ok(bytes.split_to(count))
}
