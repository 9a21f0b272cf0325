use super::{Reader, Tag, Value};

/// Object keys naming vector components, in component order.
const AXES: [&str; 4] = ["x", "y", "z", "w"];

/// Conversion from a decoded record into a Rust value.
///
/// `value` has already been read from `reader`. Scalar implementations
/// only look at `value`; aggregate ones keep reading from `reader` until
/// the aggregate is closed, whether or not the conversion succeeds, so the
/// reader is always left just past the record.
///
/// Conversions are conservative: an integer only comes from the integer
/// family and a float only from the float family. Narrowing an integer to
/// a smaller type truncates, as `as` does.
///
/// # Examples
///
/// ```
/// use skein::tbsf::{Reader, Writer};
///
/// # fn main() -> Result<(), skein::tbsf::EncodeError> {
/// let mut writer = Writer::new(Vec::new());
/// writer.begin_object()?;
/// writer.string("y")?;
/// writer.f64(2.0)?;
/// writer.string("x")?;
/// writer.f32(1.0)?;
/// writer.end_object()?;
/// writer.f32v3([4.0, 5.0, 6.0])?;
/// let bytes = writer.into_inner();
///
/// let mut reader = Reader::new(&bytes);
/// assert_eq!(reader.read::<[f32; 2]>(), Some([1.0, 2.0]));
/// assert_eq!(reader.read::<[f32; 3]>(), Some([4.0, 5.0, 6.0]));
/// # Ok(())
/// # }
/// ```
pub trait Deserialize<'a>: Sized {
    /// Convert `value`, reading further records from `reader` if it opens
    /// an aggregate. `None` if the record does not have the expected shape.
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self>;
}

/// Read to the end of `value` if it opens an aggregate.
fn finish<'a>(reader: &mut Reader<'a>, value: &Value<'a>) {
    if value.tag().is_list() {
        while reader.iterate_list(value).is_some() {}
    } else if value.tag().is_object() {
        while reader.iterate_object(value).is_some() {}
    }
}

macro_rules! integer_deserialize {
    ($($ty:ty),*) => {
        $(
            impl<'a> Deserialize<'a> for $ty {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
                    finish(reader, value);
                    value.as_i64().map(|v| v as $ty)
                }
            }
        )*
    };
}

integer_deserialize!(i8, i16, i32, u8, u16, u32, u64);

impl<'a> Deserialize<'a> for i64 {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_i64()
    }
}

impl<'a> Deserialize<'a> for f64 {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_f64()
    }
}

impl<'a> Deserialize<'a> for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_f64().map(|v| v as Self)
    }
}

impl<'a> Deserialize<'a> for bool {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_bool()
    }
}

impl<'a> Deserialize<'a> for &'a str {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_str()
    }
}

impl<'a> Deserialize<'a> for String {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        <&'a str>::deserialize(reader, value).map(str::to_owned)
    }
}

impl<'a> Deserialize<'a> for &'a [u8] {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        finish(reader, value);
        value.as_binary()
    }
}

/// The record itself. Aggregates are left open for the caller to walk.
impl<'a> Deserialize<'a> for Value<'a> {
    fn deserialize(_reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        (!value.is_error()).then_some(*value)
    }
}

/// NULL becomes `Some(None)`, anything else goes through `T`.
impl<'a, T: Deserialize<'a>> Deserialize<'a> for Option<T> {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::deserialize(reader, value).map(Some)
        }
    }
}

/// Every item of a list. Fails if any item fails, after reading the
/// whole list.
impl<'a, T: Deserialize<'a>> Deserialize<'a> for Vec<T> {
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        if !value.tag().is_list() {
            finish(reader, value);
            return None;
        }

        let mut out = Some(Self::new());
        while let Some(item) = reader.iterate_list(value) {
            match (T::deserialize(reader, &item), out.as_mut()) {
                (Some(v), Some(items)) => items.push(v),
                _ => out = None,
            }
        }
        out
    }
}

/// Fill an `N` component vector from a native vector record, an object
/// keyed `x`, `y`, `z`, `w`, or a list holding at least `N` items that
/// convert.
///
/// Succeeds only if every component was filled.
fn components<'a, C, const N: usize>(
    reader: &mut Reader<'a>,
    value: &Value<'a>,
    native: Option<&[C]>,
    component: impl Fn(&Value<'a>) -> Option<C>,
) -> Option<[C; N]>
where
    C: Copy + Default,
{
    if let Some(src) = native {
        let mut out = [C::default(); N];
        out.copy_from_slice(src.get(..N)?);
        return Some(out);
    }

    let mut out = [C::default(); N];
    let mut filled = [false; N];
    match value.tag() {
        tag if tag.is_object() => {
            while let Some((key, val)) = reader.iterate_object(value) {
                let slot = AXES.iter().take(N).position(|axis| key.str_eq(axis));
                if let (Some(i), Some(c)) = (slot, component(&val)) {
                    out[i] = c;
                    filled[i] = true;
                }
            }
        },
        tag if tag.is_list() => {
            // items that do not convert are passed over, not counted
            let mut next = 0;
            while let Some(item) = reader.iterate_list(value) {
                if let (true, Some(c)) = (next < N, component(&item)) {
                    out[next] = c;
                    filled[next] = true;
                    next += 1;
                }
            }
        },
        Tag::Error => return None,
        _ => {},
    }

    filled.iter().all(|&f| f).then_some(out)
}

impl<'a, const N: usize> Deserialize<'a> for [f32; N] {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        components(reader, value, value.as_f32s(), |v| v.as_f64().map(|f| f as f32))
    }
}

impl<'a, const N: usize> Deserialize<'a> for [i32; N] {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize(reader: &mut Reader<'a>, value: &Value<'a>) -> Option<Self> {
        components(reader, value, value.as_i32s(), |v| v.as_i64().map(|i| i as i32))
    }
}
