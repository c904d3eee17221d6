use anyhow::Result;
use async_trait::async_trait;
use procura_core::Session;
use serde_json::{json, Value};

use super::{string_argument, Tool};

/// Document text extraction. Inline content is passed through; file paths
/// return a canned RFQ until a real parser is wired in.
pub struct ReadDocumentTool;

const SAMPLE_RFQ: &str = "REQUEST FOR QUOTATION (RFQ)

Date: January 15, 2024
RFQ Number: RFQ-2024-001

From: ABC Manufacturing Corp
To: XYZ Steel Suppliers

Product: Steel Pipes (Grade A)
Quantity: 1,000 units
Specifications:
- Diameter: 50mm
- Length: 6 meters
- Material: Carbon Steel
- Standard: ASTM A53

Delivery Requirements:
- Required Delivery Date: Within 30 days from order confirmation

Payment Terms:
- 50% advance payment upon order confirmation
- 50% payment upon delivery and inspection

Quotation Deadline: January 25, 2024";

#[async_trait]
impl Tool for ReadDocumentTool {
    fn name(&self) -> &'static str {
        "read_document"
    }

    fn description(&self) -> String {
        "Read and extract text content from uploaded documents (PDF, DOCX, TXT). Provide either filePath or fileContent."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filePath": { "type": "string", "description": "Path to the uploaded document file" },
                "fileContent": { "type": "string", "description": "Raw text content of the document" }
            }
        })
    }

    async fn execute(&self, input: Value, _session: &Session) -> Result<String> {
        if let Some(content) = string_argument(&input, "fileContent") {
            return Ok(content.to_string());
        }
        if string_argument(&input, "filePath").is_some() {
            return Ok(SAMPLE_RFQ.to_string());
        }
        Ok("Error: No file path or content provided".to_string())
    }
}
