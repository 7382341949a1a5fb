//! Typed access to the url captures a route pattern produced.
//!
//! ```
//! use relay_http::protocol::{Method, Request};
//!
//! let mut request = Request::new(Method::Post, "/api/part/42/bob");
//! request.set_captures(vec!["42".into(), "bob".into()]);
//!
//! let (part, name) = request.captures::<(u32, String)>().unwrap();
//! assert_eq!(part, 42);
//! assert_eq!(name, "bob");
//! ```

use crate::protocol::CaptureError;

/// A single capture that can be built from its matched text.
pub trait FromCapture: Sized {
    const KIND: &'static str;

    fn from_capture(value: &str) -> Option<Self>;
}

/// A fixed-arity group of captures.
pub trait FromCaptures: Sized {
    fn from_captures(captures: &[String]) -> Result<Self, CaptureError>;
}

impl FromCapture for String {
    const KIND: &'static str = "string";

    fn from_capture(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

/// Plain decimal digits, no sign and no leading zero except for `0` itself.
fn is_canonical_integer(value: &str) -> bool {
    match value.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

macro_rules! impl_from_capture_for_int {
    ($($int:ty)*) => {
        $(
        impl FromCapture for $int {
            const KIND: &'static str = stringify!($int);

            fn from_capture(value: &str) -> Option<Self> {
                if !is_canonical_integer(value) {
                    return None;
                }
                value.parse().ok()
            }
        }
        )*
    };
}

impl_from_capture_for_int! { u8 u16 u32 u64 usize i32 i64 }

macro_rules! impl_from_captures_for_tuple {
    ($len:literal, $($index:tt $param:ident)*) => {
        impl<$($param,)*> FromCaptures for ($($param,)*)
        where
            $($param: FromCapture,)*
        {
            fn from_captures(captures: &[String]) -> Result<Self, CaptureError> {
                if captures.len() != $len {
                    return Err(CaptureError::Arity { expected: $len, found: captures.len() });
                }

                Ok(($(
                    $param::from_capture(&captures[$index]).ok_or_else(|| CaptureError::Invalid {
                        index: $index,
                        value: captures[$index].clone(),
                        kind: $param::KIND,
                    })?,
                )*))
            }
        }
    };
}

impl_from_captures_for_tuple! { 1, 0 A }
impl_from_captures_for_tuple! { 2, 0 A 1 B }
impl_from_captures_for_tuple! { 3, 0 A 1 B 2 C }
impl_from_captures_for_tuple! { 4, 0 A 1 B 2 C 3 D }
