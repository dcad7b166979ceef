#![no_main]
use libfuzzer_sys::fuzz_target;
use tsf_core::OutputBuffer;

// Random push/extend/retract sequences must keep the buffer contents equal
// to a plain Vec model.
fuzz_target!(|data: &[u8]| {
    let Some((&initial, ops)) = data.split_first() else {
        return;
    };
    let mut backing = vec![0u8; usize::from(initial % 64)];
    let mut buf = OutputBuffer::new(&mut backing);
    let mut model: Vec<u8> = Vec::new();

    for chunk in ops.chunks(2) {
        let op = chunk[0] % 4;
        let arg = chunk.get(1).copied().unwrap_or(0);
        match op {
            0 => {
                if buf.push(arg).is_err() {
                    return;
                }
                model.push(arg);
            }
            1 => {
                let bytes = vec![arg; usize::from(arg % 32)];
                if buf.extend_from_slice(&bytes).is_err() {
                    return;
                }
                model.extend_from_slice(&bytes);
            }
            2 => {
                let n = usize::from(arg).min(buf.pos());
                buf.retract(n);
                model.truncate(model.len() - n);
            }
            _ => {
                if buf.reserve(usize::from(arg)).is_err() {
                    return;
                }
                assert!(buf.remaining_space() >= usize::from(arg));
            }
        }
        assert_eq!(buf.as_bytes(), model.as_slice());
        assert!(buf.pos() <= buf.capacity());
    }

    if let Ok(done) = buf.finish() {
        assert_eq!(done.as_bytes(), model.as_slice());
    }
});
