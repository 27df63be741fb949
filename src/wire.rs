//! Byte-level payloads exchanged with the shell's icon list control.
//!
//! Every layout here is spelled out with explicit offsets so nothing depends
//! on how this crate's own structs happen to be laid out in memory.

use crate::errors::DecodeError;

pub const LVM_FIRST: u32 = 0x1000;
pub const LVM_GETITEMCOUNT: u32 = LVM_FIRST + 4;
pub const LVM_SETITEMPOSITION: u32 = LVM_FIRST + 15;
pub const LVM_GETITEMPOSITION: u32 = LVM_FIRST + 16;
pub const LVM_GETITEMTEXTW: u32 = LVM_FIRST + 115;

pub const LVIF_TEXT: u32 = 0x0001;

/// Size of the position slot: two little-endian `i32` values.
pub const POINT_SIZE: usize = 8;

/// Default capacity of the staged text buffer, in UTF-16 units.
pub const DEFAULT_TEXT_CAPACITY: usize = 256;

/// Largest text buffer ever staged, in UTF-16 units. Keeps the staged size
/// and the descriptor's `i32` capacity field far from overflow.
pub const MAX_TEXT_CAPACITY: usize = 32_767;

/// Pointer width of the process that owns the control. Decides where the
/// pointer-sized fields of the text descriptor sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    pub fn host() -> Self {
        if cfg!(target_pointer_width = "64") {
            PointerWidth::Bits64
        } else {
            PointerWidth::Bits32
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }
}

struct DescriptorLayout {
    mask: usize,
    item: usize,
    sub_item: usize,
    state: usize,
    state_mask: usize,
    text_ptr: usize,
    text_capacity: usize,
    image: usize,
    lparam: usize,
    size: usize,
}

const LAYOUT_32: DescriptorLayout = DescriptorLayout {
    mask: 0,
    item: 4,
    sub_item: 8,
    state: 12,
    state_mask: 16,
    text_ptr: 20,
    text_capacity: 24,
    image: 28,
    lparam: 32,
    size: 36,
};

// 4 bytes of padding after state_mask align text_ptr to 8.
const LAYOUT_64: DescriptorLayout = DescriptorLayout {
    mask: 0,
    item: 4,
    sub_item: 8,
    state: 12,
    state_mask: 16,
    text_ptr: 24,
    text_capacity: 32,
    image: 36,
    lparam: 40,
    size: 48,
};

fn layout_for(width: PointerWidth) -> &'static DescriptorLayout {
    match width {
        PointerWidth::Bits32 => &LAYOUT_32,
        PointerWidth::Bits64 => &LAYOUT_64,
    }
}

/// Encoded size of a [`TextRequest`] for the given pointer width.
pub fn descriptor_size(width: PointerWidth) -> usize {
    layout_for(width).size
}

/// The "fetch display text" item descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRequest {
    pub mask: u32,
    pub item: i32,
    pub sub_item: i32,
    pub state: u32,
    /// Foreign address of the text buffer the control fills.
    pub text_ptr: u64,
    /// Capacity of that buffer in UTF-16 units.
    pub text_capacity: i32,
}

impl TextRequest {
    pub fn new(item: i32, text_ptr: u64, text_capacity: i32) -> Self {
        Self {
            mask: LVIF_TEXT,
            item,
            sub_item: 0,
            state: 0,
            text_ptr,
            text_capacity,
        }
    }

    pub fn encode(&self, width: PointerWidth) -> Vec<u8> {
        let layout = layout_for(width);
        let mut buf = vec![0u8; layout.size];
        put_u32(&mut buf, layout.mask, self.mask);
        put_i32(&mut buf, layout.item, self.item);
        put_i32(&mut buf, layout.sub_item, self.sub_item);
        put_u32(&mut buf, layout.state, self.state);
        put_u32(&mut buf, layout.state_mask, 0);
        match width {
            PointerWidth::Bits32 => put_u32(&mut buf, layout.text_ptr, self.text_ptr as u32),
            PointerWidth::Bits64 => {
                buf[layout.text_ptr..layout.text_ptr + 8].copy_from_slice(&self.text_ptr.to_le_bytes())
            }
        }
        put_i32(&mut buf, layout.text_capacity, self.text_capacity);
        put_i32(&mut buf, layout.image, 0);
        // lparam stays zero
        debug_assert!(layout.lparam + width.bytes() == layout.size);
        buf
    }

    /// Parse a descriptor the way the control would. Returns `None` when
    /// `bytes` is shorter than the layout.
    pub fn decode(bytes: &[u8], width: PointerWidth) -> Option<Self> {
        let layout = layout_for(width);
        if bytes.len() < layout.size {
            return None;
        }
        let text_ptr = match width {
            PointerWidth::Bits32 => get_u32(bytes, layout.text_ptr) as u64,
            PointerWidth::Bits64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[layout.text_ptr..layout.text_ptr + 8]);
                u64::from_le_bytes(raw)
            }
        };
        Some(Self {
            mask: get_u32(bytes, layout.mask),
            item: get_u32(bytes, layout.item) as i32,
            sub_item: get_u32(bytes, layout.sub_item) as i32,
            state: get_u32(bytes, layout.state),
            text_ptr,
            text_capacity: get_u32(bytes, layout.text_capacity) as i32,
        })
    }
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub fn encode_point(x: i32, y: i32) -> [u8; POINT_SIZE] {
    let mut buf = [0u8; POINT_SIZE];
    put_i32(&mut buf, 0, x);
    put_i32(&mut buf, 4, y);
    buf
}

/// Returns `None` if fewer than [`POINT_SIZE`] bytes are available.
pub fn decode_point(bytes: &[u8]) -> Option<(i32, i32)> {
    if bytes.len() < POINT_SIZE {
        return None;
    }
    Some((get_u32(bytes, 0) as i32, get_u32(bytes, 4) as i32))
}

/// Pack a position into the control's combined form: low word `x`, high
/// word `y`. Components outside `i16` are truncated to their low 16 bits.
pub fn pack_position(x: i32, y: i32) -> isize {
    let low = x as u16 as u32;
    let high = y as u16 as u32;
    ((high << 16) | low) as isize
}

pub fn unpack_position(packed: isize) -> (i32, i32) {
    let raw = packed as u32;
    let x = (raw & 0xFFFF) as u16 as i16 as i32;
    let y = (raw >> 16) as u16 as i16 as i32;
    (x, y)
}

/// Whether `(x, y)` survives [`pack_position`] unchanged.
pub fn fits_packed(x: i32, y: i32) -> bool {
    let range = i16::MIN as i32..=i16::MAX as i32;
    range.contains(&x) && range.contains(&y)
}

/// Decode a NUL-terminated UTF-16LE buffer. Text stops at the first NUL or at
/// the end of the buffer; a trailing odd byte is ignored.
pub fn decode_wide_text(bytes: &[u8]) -> Result<String, DecodeError> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16(&units).map_err(|_| DecodeError)
}

/// UTF-16LE encoding with a terminating NUL.
pub fn encode_wide_text(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}
