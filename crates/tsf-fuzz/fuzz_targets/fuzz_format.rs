#![no_main]
use libfuzzer_sys::fuzz_target;
use tsf_core::{Arg, EscapeContext, FormatConfig, Formatter};

// Layout: [stack_capacity, growth_ceiling, nargs, args..., format...]
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let config = FormatConfig::new()
        .with_stack_capacity(usize::from(data[0]) * 4)
        .with_growth_ceiling(usize::from(data[1]) * 64 + 1);
    let nargs = usize::from(data[2] % 8);
    let mut rest = &data[3..];

    let mut args = Vec::with_capacity(nargs);
    for _ in 0..nargs {
        let Some((&kind, tail)) = rest.split_first() else {
            break;
        };
        let take = tail.len().min(8);
        let (payload, tail) = tail.split_at(take);
        let mut word = [0u8; 8];
        word[..take].copy_from_slice(payload);
        let bits = u64::from_le_bytes(word);
        args.push(match kind % 8 {
            0 => Arg::Null,
            1 => Arg::Pointer(bits as usize),
            2 => Arg::CStr(payload),
            3 => Arg::I32(bits as i32),
            4 => Arg::U32(bits as u32),
            5 => Arg::I64(bits as i64),
            6 => Arg::U64(bits),
            _ => Arg::F64(f64::from_bits(bits)),
        });
        rest = tail;
    }

    let mut small = [0u8; 8];
    for escapes in [EscapeContext::default(), EscapeContext::sql()] {
        let formatter = Formatter::new().with_escapes(escapes).with_config(config);
        let Ok(owned) = formatter.format_bytes(rest, &args) else {
            continue;
        };
        // Caller-supplied storage never changes the rendering.
        if let Ok(into) = formatter.format_into(&mut small, rest, &args) {
            assert_eq!(into.as_bytes(), owned.as_slice());
            assert_eq!(into.as_bytes_with_nul().last(), Some(&0));
        }
        // Without arguments the output is the format up to its first NUL.
        if args.is_empty() {
            let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            assert_eq!(owned.as_slice(), &rest[..end]);
        }
    }
});
