//! Built-in layout for the albums report, seeded at startup so the demo works
//! without opening the designer first.

use serde_json::{json, Value};

/// Report type of the albums listing
pub const ALBUMS_REPORT: &str = "albums_report";

/// Layout used for [`ALBUMS_REPORT`] until one is saved from the designer.
///
/// Its parameters match what `GET /album/report` passes in: `year`, `albums`
/// and `current_date`.
pub fn albums_report_template() -> Value {
    json!({
        "docElements": [
            {
                "id": 1,
                "elementType": "text",
                "x": 0, "y": 0, "width": 400, "height": 20,
                "content": "Albums ${year}",
                "styleId": 1
            },
            {
                "id": 2,
                "elementType": "text",
                "x": 400, "y": 0, "width": 140, "height": 20,
                "content": "${current_date}"
            },
            {
                "id": 3,
                "elementType": "table",
                "x": 0, "y": 40, "width": 540, "height": 40,
                "dataSource": "${albums}",
                "columns": 4,
                "header": true,
                "headerData": {
                    "columnData": [
                        { "content": "Name" },
                        { "content": "Artist" },
                        { "content": "Year" },
                        { "content": "Best of" }
                    ]
                },
                "contentDataRows": [
                    {
                        "columnData": [
                            { "content": "${name}" },
                            { "content": "${artist}" },
                            { "content": "${year}" },
                            { "content": "${best_of_compilation}" }
                        ]
                    }
                ]
            }
        ],
        "styles": [
            { "id": 1, "name": "Title", "bold": true, "fontSize": 18 }
        ],
        "parameters": [
            { "id": 10, "name": "year", "type": "number", "nullable": true, "testData": "" },
            {
                "id": 11,
                "name": "albums",
                "type": "array",
                "children": [
                    { "id": 12, "name": "name", "type": "string" },
                    { "id": 13, "name": "artist", "type": "string" },
                    { "id": 14, "name": "year", "type": "number" },
                    { "id": 15, "name": "best_of_compilation", "type": "boolean" }
                ],
                "testData": []
            },
            { "id": 16, "name": "current_date", "type": "date", "testData": "" }
        ],
        "documentProperties": {
            "pageFormat": "A4",
            "orientation": "portrait",
            "unit": "mm",
            "marginLeft": "20",
            "marginTop": "20",
            "marginRight": "20",
            "marginBottom": "10",
            "header": true,
            "footer": true
        },
        "version": 2
    })
}
