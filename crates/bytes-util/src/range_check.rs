//! Bounds checking for values written into fixed-width fields.

/// Enforces that a number lies within the inclusive \[LOWER, UPPER\] bounds.
///
/// Evaluates to an [`std::io::Result<()>`] so it can be used with `?` right
/// before a narrowing write.
#[macro_export]
macro_rules! range_check {
    ($n:expr, $lower:expr, $upper:expr) => {{
        let n = $n;

        #[allow(unused_comparisons, clippy::manual_range_contains)]
        if n < $lower || n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!(
                    "{} does not fit in [{}, {}]: {}",
                    stringify!($n),
                    $lower,
                    $upper,
                    n
                ),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    #[test]
    fn test_in_range() {
        let size = 0x00FF_FFFFu32;
        range_check!(size, 0, 0x00FF_FFFF).unwrap();
    }

    #[test]
    fn test_out_of_range_message() {
        let size = 0x0100_0000u32;
        let err = range_check!(size, 0, 0x00FF_FFFF).unwrap_err();
        assert_eq!(
            err.to_string(),
            "size does not fit in [0, 16777215]: 16777216"
        );
    }
}
