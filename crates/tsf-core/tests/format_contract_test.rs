use std::ffi::CString;
use std::ptr;
use std::thread;

use tsf_core::backend::{self, FormatSpec, Rendered};
use tsf_core::integer::{FastInt, format_plain};
use tsf_core::{
    Arg, EscapeContext, FormatConfig, Formatter, OutputBuffer, ToArg, format, format_bytes,
    format_into, tsf,
};

struct Case {
    fmt: &'static str,
    args: Vec<Arg<'static>>,
    expected: &'static str,
}

fn case(fmt: &'static str, args: Vec<Arg<'static>>, expected: &'static str) -> Case {
    Case {
        fmt,
        args,
        expected,
    }
}

fn check(cases: &[Case]) {
    for c in cases {
        let got = format(c.fmt, &c.args).unwrap();
        assert_eq!(got, c.expected, "format {:?} with {:?}", c.fmt, c.args);
    }
}

#[test]
fn concrete_scenarios() {
    check(&[
        case("%v %v", vec![Arg::CStr(b"abc"), Arg::I32(123)], "abc 123"),
        case("%.3f", vec![Arg::F64(25.5)], "25.500"),
        case("%x", vec![Arg::I32(255)], "ff"),
        case("hello", vec![], "hello"),
        case("%q", vec![Arg::I32(42)], "%q"),
    ]);
}

#[test]
fn unhooked_escape_does_not_consume_argument() {
    assert_eq!(tsf!("%q %d", 42).unwrap(), "%q 42");
    assert_eq!(tsf!("%Q|%s", "x").unwrap(), "%Q|x");
}

#[test]
fn long_literal_with_tiny_buffer() {
    let text = "abcdefghij".repeat(1000);
    let mut small = [0u8; 16];

    let out = format_into(&mut small, &text, &[]).unwrap();
    assert!(!out.is_borrowed());
    assert_eq!(out.len(), 10_000);
    assert_eq!(out.as_bytes(), text.as_bytes());

    let with_arg = format!("{text}%d");
    let out = format_into(&mut small, &with_arg, &[Arg::I32(7)]).unwrap();
    assert_eq!(out.len(), 10_001);
    assert!(out.as_bytes().ends_with(b"j7"));
}

#[test]
fn flags_width_precision() {
    check(&[
        case("%+d", vec![Arg::I32(5)], "+5"),
        case("%05d", vec![Arg::I32(-42)], "-0042"),
        case("%08.3d", vec![Arg::I32(42)], "     042"),
        case("%-6d|", vec![Arg::I32(42)], "42    |"),
        case("%#x", vec![Arg::U32(255)], "0xff"),
        case("%#o", vec![Arg::U32(8)], "010"),
        case("%10.4s|", vec![Arg::CStr(b"abcdefgh")], "      abcd|"),
        case("%lu", vec![Arg::U64(u64::MAX)], "18446744073709551615"),
    ]);
}

#[test]
fn retyping_follows_the_argument() {
    check(&[
        case("%u", vec![Arg::I32(-1)], "4294967295"),
        case("%s", vec![Arg::I32(42)], "42"),
        case("%d", vec![Arg::F64(2.5)], "2.5"),
        case("%d", vec![Arg::CStr(b"text")], "text"),
        case("%f", vec![Arg::I64(-3)], "-3"),
        case("%x", vec![Arg::Pointer(0x1000)], "0x1000"),
        case("%c", vec![Arg::U32(65)], "65"),
        case("%c", vec![Arg::I32(65)], "A"),
        case("%S", vec![Arg::CStr(b"narrow")], "narrow"),
        case("[%s]", vec![Arg::Null], "[]"),
    ]);
}

#[test]
fn generic_value_matches_natural_letter() {
    let wide: &'static [u16] = &[0x77, 0x69, 0x64, 0x65];
    let samples = [
        (Arg::Null, "%s"),
        (Arg::Pointer(0xbeef), "%p"),
        (Arg::CStr(b"str"), "%s"),
        (Arg::WStr(wide), "%s"),
        (Arg::I32(-9), "%d"),
        (Arg::U32(9), "%u"),
        (Arg::I64(-1 << 40), "%d"),
        (Arg::U64(1 << 40), "%u"),
        (Arg::F64(0.125), "%g"),
    ];
    for (arg, natural) in samples {
        assert_eq!(
            format("%v", &[arg]).unwrap(),
            format(natural, &[arg]).unwrap(),
            "{arg:?}"
        );
    }
}

#[test]
fn pointers() {
    let value = 5u32;
    let p: *const u32 = &value;
    let rendered = tsf!("%p", p).unwrap();
    assert_eq!(rendered, format!("{p:p}"));
    assert_eq!(tsf!("%p", ptr::null::<u8>()).unwrap(), "(nil)");
}

#[test]
fn graceful_degradation() {
    check(&[
        case("%n", vec![Arg::I32(1)], "%n"),
        case("1 %d", vec![], "1 %d"),
        case("1 %d %d", vec![Arg::I32(2)], "1 2 %d"),
        case("%*d|", vec![Arg::I32(5), Arg::I32(42)], "5|"),
        case("%5%", vec![Arg::I32(1)], "%"),
        case("50%!", vec![Arg::I32(1)], "50%!"),
        case("end %", vec![Arg::I32(1)], "end %"),
        case("%y", vec![Arg::I32(1)], "%y"),
        case(
            "%-+ #0123456789.5d",
            vec![Arg::I32(1)],
            "%-+ #0123456789.5d",
        ),
    ]);
}

#[test]
fn sql_escapes() {
    let f = Formatter::new().with_escapes(EscapeContext::sql());
    let out = f
        .format(
            "INSERT INTO %Q VALUES (%q, %q, %q)",
            &[
                Arg::CStr(b"weird\"name"),
                Arg::CStr(b"O'Brien"),
                Arg::I32(7),
                Arg::Null,
            ],
        )
        .unwrap();
    assert_eq!(
        out,
        "INSERT INTO \"weird\"\"name\" VALUES ('O''Brien', 7, NULL)"
    );
}

#[test]
fn growth_ceiling_bounds_one_directive() {
    let f = Formatter::new().with_config(FormatConfig::new().with_growth_ceiling(64));
    let out = f.format("%100d", &[Arg::I32(7)]).unwrap();
    assert_eq!(out, " ".repeat(64));

    // Literal text is not subject to the ceiling.
    let text = "x".repeat(500);
    assert_eq!(f.format(&text, &[Arg::I32(1)]).unwrap(), text);
}

#[test]
fn floats() {
    check(&[
        case("%g", vec![Arg::F64(0.0001)], "0.0001"),
        case("%g", vec![Arg::F64(0.00001)], "1e-05"),
        case("%e", vec![Arg::F64(-1234.5)], "-1.234500e+03"),
        case("%a", vec![Arg::F64(1.0)], "0x1p+0"),
        case("%A", vec![Arg::F64(-2.0)], "-0X1P+1"),
        case("%8.2f|", vec![Arg::F64(3.14159)], "    3.14|"),
        case("%f", vec![Arg::F64(f64::NAN)], "nan"),
        case("%v", vec![Arg::F64(100000.0)], "100000"),
        case("%v", vec![Arg::F64(1e6)], "1e+06"),
    ]);
    assert_eq!(tsf!("%f", 1.5f32).unwrap(), "1.500000");
}

#[test]
fn huge_precision_is_bounded() {
    // Precision is clamped and the rendering cut off at the growth ceiling.
    let out = tsf!("%.2000000f", 1.0).unwrap();
    assert_eq!(out.len(), 1 << 20);
    assert!(out.starts_with("1.000"));
    let out = tsf!("%.900f", 1.0).unwrap();
    assert_eq!(out.len(), 902);
}

#[test]
fn precision_past_u16_range_renders() {
    let out = tsf!("%.65536f", 1.0).unwrap();
    assert_eq!(out.len(), 65_538);
    assert!(out.starts_with("1.0") && out.ends_with('0'));

    let out = tsf!("%.70000e", -2.5).unwrap();
    assert_eq!(out.len(), 1 + 2 + 70_000 + 4);
    assert!(out.starts_with("-2.50") && out.ends_with("0e+00"));

    assert_eq!(tsf!("%.70000g", 1.0).unwrap(), "1");
    assert_eq!(tsf!("%#.70000g", 1.0).unwrap().len(), 70_001);
}

#[test]
fn wide_strings() {
    let wide: Vec<u16> = "grüße 🦀".encode_utf16().collect();
    assert_eq!(tsf!("<%s>", wide).unwrap(), "<grüße 🦀>");
    let unpaired = [0x61u16, 0xD800, 0x62, 0, 0x63];
    assert_eq!(tsf!("%s", unpaired).unwrap(), "a\u{FFFD}b");
}

#[test]
fn native_types_classify() {
    let owned = String::from("owned");
    let c = CString::new("cstr").unwrap();
    let out = tsf!(
        "%s %s %s %d %u %d %u %g",
        "lit",
        owned,
        c,
        -3i8,
        250u8,
        -70000i64,
        70000u64,
        0.5f32
    )
    .unwrap();
    assert_eq!(out, "lit owned cstr -3 250 -70000 70000 0.5");
    assert_eq!(().to_arg(), Arg::Null);
}

#[test]
fn borrowed_result_when_output_fits() {
    let mut buf = [0u8; 64];
    let out = format_into(&mut buf, "%s-%d", &[Arg::CStr(b"id"), Arg::I32(9)]).unwrap();
    assert!(out.is_borrowed());
    assert_eq!(out.as_bytes_with_nul(), b"id-9\0");

    let mut tiny = [0u8; 2];
    let out = format_into(&mut tiny, "%s-%d", &[Arg::CStr(b"id"), Arg::I32(9)]).unwrap();
    assert!(!out.is_borrowed());
    assert_eq!(out.into_vec(), b"id-9");
}

#[test]
fn zero_argument_output_is_a_copy() {
    let input = b"copy me".to_vec();
    let out = format_bytes(&input, &[]).unwrap();
    assert_eq!(out, input);
    assert_ne!(out.as_ptr(), input.as_ptr());

    let mut buf = [0u8; 32];
    let out = format_into(&mut buf, &input, &[]).unwrap();
    assert_eq!(out.as_bytes(), input.as_slice());
    assert_ne!(out.as_bytes().as_ptr(), input.as_ptr());
}

#[test]
fn output_buffer_invariant_under_repeated_growth() {
    let mut buf = OutputBuffer::new(&mut []);
    for round in 0..200usize {
        let chunk = vec![b'z'; round % 37];
        buf.extend_from_slice(&chunk).unwrap();
        assert!(buf.pos() <= buf.capacity());
        let claimed = buf.add_uninitialized(round % 11).unwrap().len();
        buf.retract(claimed);
        assert!(buf.pos() <= buf.capacity());
    }
}

#[test]
fn concurrent_formatting_is_deterministic() {
    let expected = tsf!("%s:%08x:%.2f", "worker", 0xabcdu32, 1.25).unwrap();
    thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..500)
                        .map(|_| tsf!("%s:%08x:%.2f", "worker", 0xabcdu32, 1.25).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for got in handle.join().unwrap() {
                assert_eq!(got, expected);
            }
        }
    });
}

/// Small deterministic generator for sampling integers.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0
    }
}

#[test]
fn fast_integer_path_matches_backend() {
    let mut rng = Lcg(0x5eed);
    let mut values: Vec<FastInt> = vec![
        FastInt::I32(0),
        FastInt::I32(i32::MIN),
        FastInt::I32(i32::MAX),
        FastInt::U32(u32::MAX),
        FastInt::I64(i64::MIN),
        FastInt::I64(i64::MAX),
        FastInt::U64(u64::MAX),
    ];
    for _ in 0..2000 {
        let r = rng.next();
        values.push(match r % 4 {
            0 => FastInt::I32(r as i32 >> (r % 31)),
            1 => FastInt::U32((r >> 32) as u32 >> (r % 31)),
            2 => FastInt::I64(r as i64 >> (r % 63)),
            _ => FastInt::U64(r >> (r % 63)),
        });
    }

    for value in values {
        let arg = match value {
            FastInt::I32(v) => Arg::I32(v),
            FastInt::U32(v) => Arg::U32(v),
            FastInt::I64(v) => Arg::I64(v),
            FastInt::U64(v) => Arg::U64(v),
        };
        for letter in [b'd', b'i', b'u', b'x', b'X'] {
            let mut fast = [0u8; 32];
            let n = format_plain(&mut fast, letter, value).unwrap();

            let mut slow = [0u8; 32];
            let m = match backend::render(&mut slow, &FormatSpec::plain(letter), &arg) {
                Rendered::Complete(m) => m,
                Rendered::Truncated(_) => panic!("backend truncated {value:?}"),
            };
            assert_eq!(&fast[..n], &slow[..m], "{value:?} as %{}", letter as char);
        }
    }
}
