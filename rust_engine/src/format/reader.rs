//! 顺序二进制读取器
//!
//! 在内存字节切片上按偏移顺序读取小端数据，读取不足时返回带偏移量的格式错误。

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Quat, Vec2, Vec3};

use crate::{MmdError, Result};

pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// 当前偏移
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// 剩余字节数
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    fn truncated(&self, what: &str) -> MmdError {
        MmdError::Format(format!(
            "truncated {} at byte {} ({} bytes left)",
            what,
            self.position(),
            self.remaining()
        ))
    }

    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        let pos = self.cursor.position();
        self.cursor.read_u8().map_err(|_| {
            self.cursor.set_position(pos);
            self.truncated(what)
        })
    }

    pub fn read_u16(&mut self, what: &str) -> Result<u16> {
        let pos = self.cursor.position();
        self.cursor.read_u16::<LittleEndian>().map_err(|_| {
            self.cursor.set_position(pos);
            self.truncated(what)
        })
    }

    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        let pos = self.cursor.position();
        self.cursor.read_u32::<LittleEndian>().map_err(|_| {
            self.cursor.set_position(pos);
            self.truncated(what)
        })
    }

    pub fn read_f32(&mut self, what: &str) -> Result<f32> {
        let pos = self.cursor.position();
        self.cursor.read_f32::<LittleEndian>().map_err(|_| {
            self.cursor.set_position(pos);
            self.truncated(what)
        })
    }

    pub fn read_vec2(&mut self, what: &str) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32(what)?, self.read_f32(what)?))
    }

    pub fn read_vec3(&mut self, what: &str) -> Result<Vec3> {
        Ok(Vec3::new(
            self.read_f32(what)?,
            self.read_f32(what)?,
            self.read_f32(what)?,
        ))
    }

    /// 读取 (x, y, z, w) 顺序的四元数
    pub fn read_quat(&mut self, what: &str) -> Result<Quat> {
        let x = self.read_f32(what)?;
        let y = self.read_f32(what)?;
        let z = self.read_f32(what)?;
        let w = self.read_f32(what)?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    pub fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(self.truncated(what));
        }
        let mut buf = [0u8; N];
        self.cursor
            .read_exact(&mut buf)
            .map_err(|_| self.truncated(what))?;
        Ok(buf)
    }

    /// 读取定长 Shift-JIS 字符串（遇到 NUL 截断）
    pub fn read_fixed_string(&mut self, len: usize, what: &str) -> Result<String> {
        let bytes = self.read_bytes(len, what)?;
        Ok(decode_shift_jis(bytes))
    }

    pub fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.truncated(what));
        }
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    pub fn skip(&mut self, len: usize, what: &str) -> Result<()> {
        self.read_bytes(len, what).map(|_| ())
    }

    /// 校验 `count` 条 `stride` 字节的记录能否放进剩余数据，避免按伪造的计数分配内存
    pub fn ensure_records(&self, count: usize, stride: usize, what: &str) -> Result<()> {
        match count.checked_mul(stride) {
            Some(total) if total <= self.remaining() => Ok(()),
            _ => Err(MmdError::Format(format!(
                "{} count {} at byte {} exceeds remaining {} bytes",
                what,
                count,
                self.position(),
                self.remaining()
            ))),
        }
    }
}

/// 解码 Shift-JIS 字符串
pub fn decode_shift_jis(bytes: &[u8]) -> String {
    // 找到第一个 null 字节
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}

/// 写入 `len` 字节的定长 Shift-JIS 字段后再读回得到的字符串
///
/// 超长的名称会被截断，截断处若切开了双字节字符，读回结果与文件中一致。
pub fn truncate_shift_jis(text: &str, len: usize) -> String {
    let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    decode_shift_jis(&encoded[..encoded.len().min(len)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let data = [0x01, 0x02, 0x00, 0x00, 0x80, 0x3F];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u16("u16").unwrap(), 0x0201);
        assert_eq!(reader.read_f32("f32").unwrap(), 1.0);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_truncated_read_is_format_error() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&data);
        let err = reader.read_u32("vertex count").unwrap_err();
        assert!(matches!(err, MmdError::Format(ref msg) if msg.contains("vertex count")));
        // 失败的读取不会移动游标
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_fixed_string_stops_at_nul() {
        let mut data = [0u8; 8];
        data[..3].copy_from_slice(b"abc");
        data[4] = b'z';
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_fixed_string(8, "name").unwrap(), "abc");
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_shift_jis_decode() {
        // "センター"
        let bytes = [0x83, 0x5A, 0x83, 0x93, 0x83, 0x5E, 0x81, 0x5B, 0x00, 0x00];
        assert_eq!(decode_shift_jis(&bytes), "センター");
    }

    #[test]
    fn test_truncate_shift_jis_matches_fixed_field() {
        assert_eq!(truncate_shift_jis("センター", 15), "センター");
        assert_eq!(truncate_shift_jis("abcdef", 4), "abcd");

        // 16 字节的名称写入 15 字节字段，最后一个双字节字符被切开
        let name = "左腕捩ダミー補助";
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode(name);
        assert_eq!(encoded.len(), 16);
        let truncated = truncate_shift_jis(name, 15);
        assert_eq!(truncated, decode_shift_jis(&encoded[..15]));
        assert_ne!(truncated, name);
    }

    #[test]
    fn test_ensure_records_rejects_oversized_count() {
        let data = [0u8; 10];
        let reader = ByteReader::new(&data);
        assert!(reader.ensure_records(2, 5, "bone").is_ok());
        assert!(reader.ensure_records(3, 5, "bone").is_err());
        assert!(reader.ensure_records(usize::MAX, 2, "bone").is_err());
    }
}
