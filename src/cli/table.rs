//! Render dữ liệu dạng bảng thành text căn lề cố định.

/// Separator giữa các cột
const COLUMN_SEPARATOR: &str = " │ ";

/// Separator giữa các cột trên dòng kẻ dưới header
const CROSS_SEPARATOR: &str = "─┼─";

/// Căn lề của một cột
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Mô tả một bảng: mỗi row phải có đúng `alignments.len()` cells
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub alignments: Vec<Align>,
    /// Kẻ dòng ngay sau row đầu tiên (header)
    pub header_separator: bool,
    pub rows: Vec<Vec<String>>,
}

fn cell_width(cell: &str) -> usize {
    cell.chars().count()
}

/// Render bảng, không có newline ở cuối. Bảng rỗng cho chuỗi rỗng.
pub fn render(table: &TableSpec) -> String {
    let mut widths = vec![0usize; table.alignments.len()];
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    for (index, row) in table.rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .zip(&table.alignments)
            .map(|((cell, &width), align)| match align {
                Align::Left => format!("{:<width$}", cell),
                Align::Right => format!("{:>width$}", cell),
            })
            .collect();
        lines.push(cells.join(COLUMN_SEPARATOR));

        if index == 0 && table.header_separator {
            let dashes: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
            lines.push(dashes.join(CROSS_SEPARATOR));
        }
    }

    lines.join("\n")
}

/// Kích thước dễ đọc với 2 chữ số thập phân, bước 1024 (`512.00 B`, `1.50 KB`)
pub fn readable_file_size(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

pub fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}
