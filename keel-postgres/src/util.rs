use crate::ValueHolder;
use async_stream::try_stream;
use keel_core::{
    Error, RowLabeled, RowNames,
    stream::{Stream, StreamExt},
};
use std::pin::pin;

pub(crate) fn row_to_keel_row(row: tokio_postgres::Row) -> keel_core::Result<keel_core::Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not deserialize column {} `{}`: {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect::<keel_core::Result<keel_core::Row>>()
}

pub(crate) fn stream_postgres_row_as_keel_row<V>(
    stream: impl AsyncFnOnce() -> keel_core::Result<V>,
) -> impl Stream<Item = keel_core::Result<RowLabeled>>
where
    V: Stream<Item = Result<tokio_postgres::Row, tokio_postgres::Error>>,
{
    try_stream! {
        let stream = stream().await?;
        let mut stream = pin!(stream);
        let mut labels: Option<RowNames> = None;
        while let Some(row) = stream.next().await.transpose()? {
            let labels = labels.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            yield RowLabeled {
                labels: labels.clone(),
                values: row_to_keel_row(row)?,
            };
        }
    }
}
