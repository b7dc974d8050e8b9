use std::ops::Div;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(FilterType::None),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Average),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }
}

/// How the encoder picks a filter for each scanline.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum FilterStrategy {
    /// Per row, the filter whose output has the smallest sum of absolute signed bytes.
    #[default]
    Adaptive,
    Fixed(FilterType),
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i16, b as i16, c as i16);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

/// Value predicted for byte `i` from its left, up and upper-left neighbours.
fn predict(filter: FilterType, sl: &[u8], prev: &[u8], i: usize, bpp: usize) -> u8 {
    let left = if i >= bpp { sl[i - bpp] } else { 0 };
    let up = prev[i];
    let up_left = if i >= bpp { prev[i - bpp] } else { 0 };

    match filter {
        FilterType::None => 0,
        FilterType::Sub => left,
        FilterType::Up => up,
        FilterType::Average => (left as u16 + up as u16).div(2) as u8,
        FilterType::Paeth => paeth_predictor(left, up, up_left),
    }
}

/// Filters raw scanline `sl` against the raw previous scanline into `out`.
pub fn filter_scanline(filter: FilterType, prev: &[u8], sl: &[u8], out: &mut [u8], bpp: usize) {
    for i in 0..sl.len() {
        out[i] = sl[i].wrapping_sub(predict(filter, sl, prev, i, bpp));
    }
}

/// Reverses `filter_scanline` in place, `prev` being the already reconstructed row above.
pub fn unfilter_scanline(filter: FilterType, prev: &[u8], sl: &mut [u8], bpp: usize) {
    for i in 0..sl.len() {
        // left neighbours are reconstructed before byte i is read
        sl[i] = sl[i].wrapping_add(predict(filter, sl, prev, i, bpp));
    }
}

fn cost(filtered: &[u8]) -> u64 {
    filtered.iter().map(|b| (*b as i8).unsigned_abs() as u64).sum()
}

/// Filters one scanline according to `strategy`, writing into `out`, returning the filter used.
pub fn encode_scanline(
    strategy: FilterStrategy,
    prev: &[u8],
    sl: &[u8],
    out: &mut [u8],
    scratch: &mut [u8],
    bpp: usize,
) -> FilterType {
    match strategy {
        FilterStrategy::Fixed(filter) => {
            filter_scanline(filter, prev, sl, out, bpp);
            filter
        }
        FilterStrategy::Adaptive => {
            let mut best = FilterType::None;
            let mut best_cost = u64::MAX;
            for filter in FilterType::ALL {
                filter_scanline(filter, prev, sl, scratch, bpp);
                let c = cost(scratch);
                if c < best_cost {
                    best_cost = c;
                    best = filter;
                    out.copy_from_slice(scratch);
                }
            }
            best
        }
    }
}

#[test]
fn test_paeth_predictor() {
    assert_eq!(paeth_predictor(10, 20, 10), 20);
    assert_eq!(paeth_predictor(20, 10, 10), 20);
    assert_eq!(paeth_predictor(0, 0, 0), 0);
    assert_eq!(paeth_predictor(255, 0, 255), 0);
}

#[test]
fn test_filter_unfilter_every_type() {
    let prev = [10u8, 200, 30, 40, 250, 60];
    let sl = [15u8, 5, 255, 0, 128, 61];
    for filter in FilterType::ALL {
        let mut out = [0u8; 6];
        filter_scanline(filter, &prev, &sl, &mut out, 3);
        unfilter_scanline(filter, &prev, &mut out, 3);
        assert_eq!(out, sl, "{:?}", filter);
    }
}

#[test]
fn test_sub_filter_values() {
    let prev = [0u8; 6];
    let sl = [1u8, 2, 3, 5, 7, 9];
    let mut out = [0u8; 6];
    filter_scanline(FilterType::Sub, &prev, &sl, &mut out, 3);
    assert_eq!(out, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_adaptive_prefers_up_on_repeated_rows() {
    let row = [90u8, 17, 240, 3, 77, 150, 9, 201, 33];
    let mut out = [0u8; 9];
    let mut scratch = [0u8; 9];
    let used = encode_scanline(FilterStrategy::Adaptive, &row, &row, &mut out, &mut scratch, 3);
    assert_eq!(used, FilterType::Up);
    assert_eq!(out, [0u8; 9]);
}

#[test]
fn test_fixed_strategy() {
    let prev = [0u8; 3];
    let sl = [4u8, 5, 6];
    let mut out = [0u8; 3];
    let mut scratch = [0u8; 3];
    let used = encode_scanline(FilterStrategy::Fixed(FilterType::None), &prev, &sl, &mut out, &mut scratch, 3);
    assert_eq!(used, FilterType::None);
    assert_eq!(out, sl);
}

#[test]
fn test_filter_type_from_u8() {
    assert_eq!(FilterType::from_u8(4), Some(FilterType::Paeth));
    assert_eq!(FilterType::from_u8(5), None);
}
