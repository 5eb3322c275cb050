use bank_core::warehouse::{JoinQuery, QueryJobSpec, TableRef, WriteDisposition};

pub fn build_query_job(
    query: &JoinQuery,
    destination: &TableRef,
    write_disposition: WriteDisposition,
) -> QueryJobSpec {
    QueryJobSpec {
        query: query.clone(),
        destination: destination.clone(),
        write_disposition,
    }
}
