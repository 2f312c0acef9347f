//! 图形的持久化：原生 JSON 格式（全保真）与 DXF 子集
//! （LINE/CIRCLE/ARC/TEXT 的互操作出入口）。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use draft_core::drawing::{Drawing, Shape};
use draft_core::geometry::Point2;

/// 原生格式的当前版本号。
const JSON_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid drawing structure: {0}")]
    InvalidDrawing(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait DrawingLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

pub trait DrawingSaver {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError>;
}

/// 原生格式的文件信封：版本号加 `Drawing` 的 serde 全量快照。
/// 图层、标识计数器与代数一并保存，读回后的图形与保存时完全一致。
#[derive(Serialize, Deserialize)]
struct JsonEnvelope {
    version: u32,
    drawing: Drawing,
}

/// 原生 JSON 格式的读写门面。
pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let envelope: JsonEnvelope = serde_json::from_str(&data)?;
        if envelope.version > JSON_FORMAT_VERSION {
            return Err(IoError::InvalidDrawing(format!(
                "不支持的文件版本 {}（当前支持到 {JSON_FORMAT_VERSION}）",
                envelope.version
            )));
        }
        Ok(envelope.drawing)
    }
}

impl DrawingSaver for JsonFacade {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError> {
        let envelope = JsonEnvelope {
            version: JSON_FORMAT_VERSION,
            drawing: drawing.clone(),
        };
        let data = serde_json::to_string_pretty(&envelope)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// DXF 互操作：只覆盖 LINE/CIRCLE/ARC/TEXT 四种实体的子集。
/// 读取时统计被跳过的未知实体数，供上层提示。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 解析 DXF 文本，返回图形与被跳过的实体数。
    pub fn parse(&self, source: &str) -> Result<(Drawing, usize), IoError> {
        let parser = DxfParser::new(source);
        parser.parse().map_err(|err| match err {
            DxfError::Invalid { message } => IoError::InvalidDrawing(message),
        })
    }

    /// 序列化为 DXF 文本。不支持的实体类型被静默跳过。
    pub fn render(&self, drawing: &Drawing) -> String {
        let mut writer = DxfWriter::new();
        writer.render(drawing)
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let (drawing, _) = self.parse(&data)?;
        Ok(drawing)
    }
}

impl DrawingSaver for DxfFacade {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError> {
        fs::write(path, self.render(drawing)).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug)]
enum DxfError {
    Invalid { message: String },
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
    skipped: usize,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
            skipped: 0,
        }
    }

    fn parse(mut self) -> Result<(Drawing, usize), DxfError> {
        let mut drawing = Drawing::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.as_str() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.as_str() {
                        "ENTITIES" => self.parse_entities(&mut drawing)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok((drawing, self.skipped))
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.as_str() {
                "ENDSEC" => break,
                "LINE" => self.parse_line(drawing)?,
                "CIRCLE" => self.parse_circle(drawing)?,
                "ARC" => self.parse_arc(drawing)?,
                "TEXT" => self.parse_text(drawing)?,
                _ => {
                    // 子集以外的实体：整体跳过并计数
                    self.skipped += 1;
                    self.skip_entity_body()?;
                }
            }
        }
        Ok(())
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }

    fn parse_line(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        let mut layer = None;
        let mut start_x = None;
        let mut start_y = None;
        let mut end_x = None;
        let mut end_y = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut start_x, &value, "LINE 起点 X（组码 10）")?,
                    20 => assign_coord(&mut start_y, &value, "LINE 起点 Y（组码 20）")?,
                    11 => assign_coord(&mut end_x, &value, "LINE 终点 X（组码 11）")?,
                    21 => assign_coord(&mut end_y, &value, "LINE 终点 Y（组码 21）")?,
                    30 | 31 => {} // 忽略 Z 坐标
                    _ => {}
                },
                None => return Err(DxfError::invalid("LINE 未正确结束")),
            }
        }

        let layer = drawing.ensure_layer(layer.as_deref().unwrap_or("0"));
        let sx = start_x.ok_or_else(|| DxfError::invalid("LINE 缺少起点 X（组码 10）"))?;
        let sy = start_y.ok_or_else(|| DxfError::invalid("LINE 缺少起点 Y（组码 20）"))?;
        let ex = end_x.ok_or_else(|| DxfError::invalid("LINE 缺少终点 X（组码 11）"))?;
        let ey = end_y.ok_or_else(|| DxfError::invalid("LINE 缺少终点 Y（组码 21）"))?;

        drawing.add_line(Point2::new(sx, sy), Point2::new(ex, ey), layer);
        Ok(())
    }

    fn parse_circle(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        let mut layer = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut center_x, &value, "CIRCLE 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "CIRCLE 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "CIRCLE 半径（组码 40）")?,
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("CIRCLE 未正确结束")),
            }
        }

        let layer = drawing.ensure_layer(layer.as_deref().unwrap_or("0"));
        let cx = center_x.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("CIRCLE 缺少半径（组码 40）"))?;
        if radius <= 0.0 {
            return Err(DxfError::invalid(format!(
                "CIRCLE 半径必须为正数，实际为 {radius}"
            )));
        }

        drawing.add_circle(Point2::new(cx, cy), radius, layer);
        Ok(())
    }

    fn parse_arc(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        let mut layer = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        let mut start_angle = None;
        let mut end_angle = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut center_x, &value, "ARC 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "ARC 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "ARC 半径（组码 40）")?,
                    // 角度在文件里以度书写，内部使用弧度
                    50 => assign_coord(&mut start_angle, &value, "ARC 起始角（组码 50）")?,
                    51 => assign_coord(&mut end_angle, &value, "ARC 终止角（组码 51）")?,
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("ARC 未正确结束")),
            }
        }

        let layer = drawing.ensure_layer(layer.as_deref().unwrap_or("0"));
        let cx = center_x.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("ARC 缺少半径（组码 40）"))?;
        let start = start_angle.ok_or_else(|| DxfError::invalid("ARC 缺少起始角（组码 50）"))?;
        let end = end_angle.ok_or_else(|| DxfError::invalid("ARC 缺少终止角（组码 51）"))?;

        drawing.add_arc(
            Point2::new(cx, cy),
            radius,
            start.to_radians(),
            end.to_radians(),
            layer,
        );
        Ok(())
    }

    fn parse_text(&mut self, drawing: &mut Drawing) -> Result<(), DxfError> {
        let mut layer = None;
        let mut insert_x = None;
        let mut insert_y = None;
        let mut height = None;
        let mut rotation_deg = 0.0;
        let mut text: Option<String> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut insert_x, &value, "TEXT 插入点 X（组码 10）")?,
                    20 => assign_coord(&mut insert_y, &value, "TEXT 插入点 Y（组码 20）")?,
                    40 => assign_coord(&mut height, &value, "TEXT 高度（组码 40）")?,
                    50 => rotation_deg = parse_f64(&value, "TEXT 旋转角（组码 50）")?,
                    1 => match text {
                        Some(ref mut existing) => {
                            existing.push('\n');
                            existing.push_str(&value);
                        }
                        None => text = Some(value),
                    },
                    7 | 72 | 73 | 11 | 21 | 30 => {
                        // 目前忽略：文字样式、对齐信息与 Z 坐标
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("TEXT 未正确结束")),
            }
        }

        let layer = drawing.ensure_layer(layer.as_deref().unwrap_or("0"));
        let ix = insert_x.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 X（组码 10）"))?;
        let iy = insert_y.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 Y（组码 20）"))?;
        let height = height.ok_or_else(|| DxfError::invalid("TEXT 缺少文字高度（组码 40）"))?;
        let content = text.ok_or_else(|| DxfError::invalid("TEXT 缺少文本内容（组码 1）"))?;

        drawing.add_text(
            Point2::new(ix, iy),
            content,
            height,
            rotation_deg.to_radians(),
            layer,
        );
        Ok(())
    }
}

/// 逐对读取 DXF 组码/值行的游标，支持单步回退。
struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => return Ok(None),
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "尝试多次回退 DXF pair");
        self.buffer = Some(pair);
    }
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

/// 最小的 DXF 写出器：只生成 ENTITIES 段，角度换回度。
struct DxfWriter {
    out: String,
}

impl DxfWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn render(&mut self, drawing: &Drawing) -> String {
        self.pair(0, "SECTION");
        self.pair(2, "ENTITIES");
        for record in drawing.entities() {
            let layer = drawing
                .layer(record.layer)
                .map(|layer| layer.name.as_str())
                .unwrap_or("0")
                .to_string();
            match &record.shape {
                Shape::Line(line) => {
                    self.pair(0, "LINE");
                    self.pair(8, &layer);
                    self.coord(10, 20, line.start);
                    self.coord(11, 21, line.end);
                }
                Shape::Circle(circle) => {
                    self.pair(0, "CIRCLE");
                    self.pair(8, &layer);
                    self.coord(10, 20, circle.center);
                    self.number(40, circle.radius);
                }
                Shape::Arc(arc) => {
                    self.pair(0, "ARC");
                    self.pair(8, &layer);
                    self.coord(10, 20, arc.center);
                    self.number(40, arc.radius);
                    self.number(50, arc.start_angle.to_degrees());
                    self.number(51, arc.end_angle.to_degrees());
                }
                Shape::Text(text) => {
                    self.pair(0, "TEXT");
                    self.pair(8, &layer);
                    self.coord(10, 20, text.insert);
                    self.number(40, text.height);
                    self.number(50, text.rotation.to_degrees());
                    self.pair(1, &text.content);
                }
                // 标注与矩形是原生格式的概念，DXF 子集不导出
                Shape::Dimension(_) | Shape::Rectangle(_) => {}
            }
        }
        self.pair(0, "ENDSEC");
        self.pair(0, "EOF");
        std::mem::take(&mut self.out)
    }

    fn pair(&mut self, code: i32, value: &str) {
        self.out.push_str(&format!("{code}\n{value}\n"));
    }

    fn coord(&mut self, code_x: i32, code_y: i32, point: Point2) {
        self.number(code_x, point.x());
        self.number(code_y, point.y());
    }

    fn number(&mut self, code: i32, value: f64) {
        self.out.push_str(&format!("{code}\n{value}\n"));
    }
}
