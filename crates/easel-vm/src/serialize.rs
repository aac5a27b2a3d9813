//! The persisted module format.
//!
//! Fixed field order, little-endian: magic + version, module name
//! (length-prefixed UTF-8), string pool, integer pool, float pool,
//! function table, initializer (0 = none, else 1 + index), instruction
//! vector of `{opcode u16, operand1 i16, operand2 i16}`. Truncated input
//! and unknown opcodes are decode errors, never panics.

use easel_core::EaselError;

use crate::module::{ExecutionModule, FunctionInfo, Instruction};
use crate::opcodes::Opcode;

const MAGIC: &[u8; 4] = b"ESLM";
const VERSION: u16 = 1;

// ── Cursor readers ────────────────────────────────────────────────

fn read_u8(buf: &[u8], cursor: &mut usize) -> Result<u8, EaselError> {
    if *cursor >= buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let v = buf[*cursor];
    *cursor += 1;
    Ok(v)
}

fn read_u16_le(buf: &[u8], cursor: &mut usize) -> Result<u16, EaselError> {
    if *cursor + 2 > buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let v = u16::from_le_bytes([buf[*cursor], buf[*cursor + 1]]);
    *cursor += 2;
    Ok(v)
}

fn read_i16_le(buf: &[u8], cursor: &mut usize) -> Result<i16, EaselError> {
    Ok(read_u16_le(buf, cursor)? as i16)
}

fn read_u32_le(buf: &[u8], cursor: &mut usize) -> Result<u32, EaselError> {
    if *cursor + 4 > buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let v = u32::from_le_bytes([
        buf[*cursor],
        buf[*cursor + 1],
        buf[*cursor + 2],
        buf[*cursor + 3],
    ]);
    *cursor += 4;
    Ok(v)
}

fn read_i64_le(buf: &[u8], cursor: &mut usize) -> Result<i64, EaselError> {
    if *cursor + 8 > buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let v = i64::from_le_bytes(buf[*cursor..*cursor + 8].try_into().unwrap());
    *cursor += 8;
    Ok(v)
}

fn read_f64_le(buf: &[u8], cursor: &mut usize) -> Result<f64, EaselError> {
    if *cursor + 8 > buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let v = f64::from_le_bytes(buf[*cursor..*cursor + 8].try_into().unwrap());
    *cursor += 8;
    Ok(v)
}

fn read_string(buf: &[u8], cursor: &mut usize) -> Result<String, EaselError> {
    let len = read_u32_le(buf, cursor)? as usize;
    if *cursor + len > buf.len() {
        return Err(EaselError::decode("unexpected end of module data"));
    }
    let bytes = &buf[*cursor..*cursor + len];
    *cursor += len;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| EaselError::decode("module string is not valid UTF-8"))
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

// ── Module encode/decode ──────────────────────────────────────────

pub fn write_module(module: &ExecutionModule) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_le_bytes());

    write_string(&mut buf, &module.name);

    buf.extend_from_slice(&(module.strings.len() as u32).to_le_bytes());
    for s in &module.strings {
        write_string(&mut buf, s);
    }

    buf.extend_from_slice(&(module.integers.len() as u32).to_le_bytes());
    for v in &module.integers {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    buf.extend_from_slice(&(module.floats.len() as u32).to_le_bytes());
    for v in &module.floats {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    buf.extend_from_slice(&(module.functions.len() as u32).to_le_bytes());
    for f in &module.functions {
        write_string(&mut buf, &f.name);
        buf.extend_from_slice(&(f.begin as u32).to_le_bytes());
        buf.extend_from_slice(&(f.len as u32).to_le_bytes());
        buf.push(f.variadic as u8);
    }

    let init = match module.initializer {
        None => 0u32,
        Some(idx) => 1 + idx as u32,
    };
    buf.extend_from_slice(&init.to_le_bytes());

    buf.extend_from_slice(&(module.instructions.len() as u32).to_le_bytes());
    for ins in &module.instructions {
        buf.extend_from_slice(&(ins.opcode as u16).to_le_bytes());
        buf.extend_from_slice(&ins.operand1.to_le_bytes());
        buf.extend_from_slice(&ins.operand2.to_le_bytes());
    }

    buf
}

pub fn read_module(buf: &[u8]) -> Result<ExecutionModule, EaselError> {
    let mut cursor = 0usize;

    let mut magic = [0u8; 4];
    for b in &mut magic {
        *b = read_u8(buf, &mut cursor)?;
    }
    if &magic != MAGIC {
        return Err(EaselError::decode("not an Easel module (bad magic)"));
    }
    let version = read_u16_le(buf, &mut cursor)?;
    if version != VERSION {
        return Err(EaselError::decode(format!(
            "unsupported module version {version}"
        )));
    }

    let name = read_string(buf, &mut cursor)?;

    let n_strings = read_u32_le(buf, &mut cursor)? as usize;
    let mut strings = Vec::with_capacity(n_strings);
    for _ in 0..n_strings {
        strings.push(read_string(buf, &mut cursor)?);
    }

    let n_integers = read_u32_le(buf, &mut cursor)? as usize;
    let mut integers = Vec::with_capacity(n_integers);
    for _ in 0..n_integers {
        integers.push(read_i64_le(buf, &mut cursor)?);
    }

    let n_floats = read_u32_le(buf, &mut cursor)? as usize;
    let mut floats = Vec::with_capacity(n_floats);
    for _ in 0..n_floats {
        floats.push(read_f64_le(buf, &mut cursor)?);
    }

    let n_functions = read_u32_le(buf, &mut cursor)? as usize;
    let mut functions = Vec::with_capacity(n_functions);
    for _ in 0..n_functions {
        let name = read_string(buf, &mut cursor)?;
        let begin = read_u32_le(buf, &mut cursor)? as usize;
        let len = read_u32_le(buf, &mut cursor)? as usize;
        let variadic = read_u8(buf, &mut cursor)? != 0;
        functions.push(FunctionInfo {
            name,
            begin,
            len,
            variadic,
        });
    }

    let init = read_u32_le(buf, &mut cursor)?;
    let initializer = match init {
        0 => None,
        idx => Some(idx as usize - 1),
    };

    let n_instructions = read_u32_le(buf, &mut cursor)? as usize;
    let mut instructions = Vec::with_capacity(n_instructions);
    for _ in 0..n_instructions {
        let raw = read_u16_le(buf, &mut cursor)?;
        let opcode = Opcode::from_u16(raw)
            .ok_or_else(|| EaselError::decode(format!("unknown opcode 0x{raw:04x}")))?;
        let operand1 = read_i16_le(buf, &mut cursor)?;
        let operand2 = read_i16_le(buf, &mut cursor)?;
        instructions.push(Instruction::new(opcode, operand1, operand2));
    }

    if cursor != buf.len() {
        return Err(EaselError::decode("trailing bytes after module data"));
    }

    Ok(ExecutionModule {
        name,
        strings,
        integers,
        floats,
        functions,
        initializer,
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ModuleBuilder;

    fn sample_module() -> ExecutionModule {
        let mut b = ModuleBuilder::new("scene.main");
        let answer = b.intern_integer(42).unwrap();
        let pi = b.intern_float(3.25).unwrap();
        let greeting = b.intern_string("hello").unwrap();

        let begin = b.next_offset();
        b.emit(Opcode::BeginFunction, 0, 0);
        b.emit(Opcode::PushInt, answer, 0);
        b.emit(Opcode::PushFlt, pi, 0);
        b.emit(Opcode::PushStr, greeting, 0);
        b.emit(Opcode::JmpFalse, 0, -2);
        b.emit(Opcode::Ret, 0, 0);
        b.emit(Opcode::EndFunction, 0, 0);
        let f = b.add_function("main", begin, false);
        b.set_initializer(f);
        b.finish()
    }

    #[test]
    fn roundtrip_is_identity() {
        let module = sample_module();
        let bytes = write_module(&module);
        let back = read_module(&bytes).unwrap();
        assert_eq!(back, module);
    }

    #[test]
    fn empty_module_roundtrip() {
        let module = ExecutionModule::new("empty");
        let back = read_module(&write_module(&module)).unwrap();
        assert_eq!(back, module);
        assert_eq!(back.initializer, None);
    }

    #[test]
    fn bad_magic_is_a_decode_error() {
        let mut bytes = write_module(&sample_module());
        bytes[0] = b'X';
        assert!(read_module(&bytes).is_err());
    }

    #[test]
    fn truncation_is_a_decode_error() {
        let bytes = write_module(&sample_module());
        for cut in [0, 3, 7, bytes.len() / 2, bytes.len() - 1] {
            assert!(read_module(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn unknown_opcode_is_a_decode_error() {
        let module = sample_module();
        let mut bytes = write_module(&module);
        // The first instruction's opcode is the last-but-n field; patch
        // it to an out-of-range value.
        let tail = module.instructions.len() * 6;
        let pos = bytes.len() - tail;
        bytes[pos] = 0xff;
        bytes[pos + 1] = 0xff;
        assert!(read_module(&bytes).is_err());
    }

    #[test]
    fn trailing_garbage_is_a_decode_error() {
        let mut bytes = write_module(&sample_module());
        bytes.push(0);
        assert!(read_module(&bytes).is_err());
    }
}
