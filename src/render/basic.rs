use bytes::Bytes;
use serde_json::{Map, Value};

use super::layout::Layout;
use super::{pdf, xlsx, OutputFormat, RenderError, RenderJob, ReportError, ReportRenderer};

/// Built-in renderer for text and table elements.
#[derive(Debug, Default, Clone)]
pub struct BasicRenderer;

impl BasicRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn data_object(data: &Value) -> Result<Map<String, Value>, RenderError> {
    match data {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        _ => Err(RenderError::Init("report data must be an object".to_string())),
    }
}

impl ReportRenderer for BasicRenderer {
    fn validate(&self, job: &RenderJob) -> Result<Vec<ReportError>, RenderError> {
        let layout = Layout::parse(&job.layout)?;
        let data = data_object(&job.data)?;
        Ok(layout.validate(&data, job.is_test_data))
    }

    fn render(&self, job: &RenderJob, format: OutputFormat) -> Result<Bytes, RenderError> {
        let layout = Layout::parse(&job.layout)?;
        let data = data_object(&job.data)?;
        let document = layout.evaluate(&data)?;

        let output = match format {
            OutputFormat::Pdf => pdf::write_pdf(&document)?,
            OutputFormat::Xlsx => xlsx::write_xlsx(&document)?,
        };
        Ok(Bytes::from(output))
    }
}
