//! Arrow encoding of frames.
//!
//! Frames leave the datasource as Arrow IPC streams, one record batch per
//! frame. The frame name, the query's ref id and the frame metadata travel
//! in the schema metadata under `name`, `refId` and `meta`.

use crate::error::FrameError;
use crate::frame::{Column, Frame};
use arrow_array::{
    ArrayRef, Float64Array, Int64Array, RecordBatch, RecordBatchOptions, StringArray,
    TimestampNanosecondArray,
};
use arrow_ipc::writer::StreamWriter;
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::collections::HashMap;
use std::sync::Arc;

/// Timezone stamped on every time field.
pub const TIME_ZONE: &str = "UTC";

/// Arrow type of a column.
pub fn column_data_type(column: &Column) -> DataType {
    match column {
        Column::Text(_) => DataType::Utf8,
        Column::Number(_) => DataType::Float64,
        Column::Time(_) => DataType::Timestamp(TimeUnit::Nanosecond, Some(TIME_ZONE.into())),
        Column::Count(_) => DataType::Int64,
    }
}

/// Gets the Arrow schema of a frame, metadata included.
pub fn frame_schema(frame: &Frame, ref_id: Option<&str>) -> Result<Schema, FrameError> {
    let fields: Vec<Field> = frame
        .fields
        .iter()
        .map(|field| {
            let nullable = !matches!(field.column, Column::Text(_));
            Field::new(field.name.as_str(), column_data_type(&field.column), nullable)
        })
        .collect();

    let mut metadata = HashMap::new();
    metadata.insert("name".to_string(), frame.name.clone());
    if let Some(ref_id) = ref_id {
        metadata.insert("refId".to_string(), ref_id.to_string());
    }
    if let Some(meta) = &frame.meta {
        metadata.insert("meta".to_string(), serde_json::to_string(meta)?);
    }

    Ok(Schema::new(fields).with_metadata(metadata))
}

fn column_array(column: &Column) -> ArrayRef {
    match column {
        Column::Text(cells) => Arc::new(StringArray::from_iter_values(cells.iter())),
        Column::Number(cells) => Arc::new(Float64Array::from(cells.clone())),
        Column::Time(cells) => Arc::new(
            TimestampNanosecondArray::from(
                cells
                    .iter()
                    .map(|cell| cell.and_then(|time| time.timestamp_nanos_opt()))
                    .collect::<Vec<_>>(),
            )
            .with_timezone(TIME_ZONE),
        ),
        Column::Count(cells) => Arc::new(Int64Array::from(cells.clone())),
    }
}

/// Creates a RecordBatch from a frame.
pub fn frame_to_record_batch(frame: &Frame, ref_id: Option<&str>) -> Result<RecordBatch, FrameError> {
    let schema = frame_schema(frame, ref_id)?;
    let arrays: Vec<ArrayRef> = frame.fields.iter().map(|field| column_array(&field.column)).collect();

    // frames without fields still need an explicit row count
    let options = RecordBatchOptions::new().with_row_count(Some(frame.row_count()));
    Ok(RecordBatch::try_new_with_options(Arc::new(schema), arrays, &options)?)
}

/// Encodes a frame as a self-contained Arrow IPC stream.
pub fn encode_frame(frame: &Frame, ref_id: Option<&str>) -> Result<Vec<u8>, FrameError> {
    let batch = frame_to_record_batch(frame, ref_id)?;
    let mut writer = StreamWriter::try_new(Vec::new(), &batch.schema())?;
    writer.write(&batch)?;
    Ok(writer.into_inner()?)
}
