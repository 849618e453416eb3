/// Carry the nearest preceding value down each column of a row-major grid.
///
/// Values never cross columns and leading gaps stay empty.
pub fn forward_fill(cells: &mut [Vec<Option<f64>>]) {
    let width = cells.first().map_or(0, Vec::len);
    for col in 0..width {
        let mut last = None;
        for row in cells.iter_mut() {
            match row[col] {
                Some(v) => last = Some(v),
                None => row[col] = last,
            }
        }
    }
}
