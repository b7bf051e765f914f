//! Retry envelope headers carried on redelivered messages.

use rdkafka::message::{Header, Headers, OwnedHeaders};

/// Number of delivery attempts already consumed.
pub const RETRY_COUNT_HEADER: &str = "x-retry-count";

/// The topic a delayed payload must be redelivered to.
pub const ORIGINAL_DESTINATION_HEADER: &str = "x-original-destination";

/// Read the attempt counter from delivery headers. Absent or malformed
/// headers count as zero.
pub fn retry_count<H: Headers>(headers: Option<&H>) -> u32 {
    let headers = match headers {
        Some(h) => h,
        None => return 0,
    };

    for header in headers.iter() {
        if header.key == RETRY_COUNT_HEADER {
            return header
                .value
                .and_then(|v| std::str::from_utf8(v).ok())
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0);
        }
    }
    0
}

/// Headers for a publish to the delay destination.
pub fn delay_headers(original_topic: &str, next_retry_count: u32) -> OwnedHeaders {
    let count = next_retry_count.to_string();
    OwnedHeaders::new()
        .insert(Header {
            key: RETRY_COUNT_HEADER,
            value: Some(count.as_bytes()),
        })
        .insert(Header {
            key: ORIGINAL_DESTINATION_HEADER,
            value: Some(original_topic.as_bytes()),
        })
}

/// Headers for a publish to the dead-letter destination. The counter is
/// carried only when `retry_count` is set.
pub fn dead_letter_headers(original_topic: &str, retry_count: Option<u32>) -> OwnedHeaders {
    let headers = OwnedHeaders::new().insert(Header {
        key: ORIGINAL_DESTINATION_HEADER,
        value: Some(original_topic.as_bytes()),
    });

    match retry_count {
        Some(count) => {
            let count = count.to_string();
            headers.insert(Header {
                key: RETRY_COUNT_HEADER,
                value: Some(count.as_bytes()),
            })
        }
        None => headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_value<'a>(headers: &'a OwnedHeaders, key: &str) -> Option<&'a [u8]> {
        headers
            .iter()
            .find(|h| h.key == key)
            .and_then(|h| h.value)
    }

    #[test]
    fn test_retry_count_defaults_to_zero() {
        assert_eq!(retry_count::<OwnedHeaders>(None), 0);

        let headers = OwnedHeaders::new().insert(Header {
            key: "some-other-header",
            value: Some(b"x".as_slice()),
        });
        assert_eq!(retry_count(Some(&headers)), 0);

        let headers = OwnedHeaders::new().insert(Header {
            key: RETRY_COUNT_HEADER,
            value: Some(b"not-a-number".as_slice()),
        });
        assert_eq!(retry_count(Some(&headers)), 0);
    }

    #[test]
    fn test_retry_count_round_trip() {
        let headers = delay_headers("product.created", 2);
        assert_eq!(retry_count(Some(&headers)), 2);
        assert_eq!(
            header_value(&headers, ORIGINAL_DESTINATION_HEADER),
            Some(b"product.created".as_slice())
        );
    }

    #[test]
    fn test_dead_letter_headers_strip_counter() {
        let headers = dead_letter_headers("product.updated", None);
        assert!(header_value(&headers, RETRY_COUNT_HEADER).is_none());
        assert_eq!(
            header_value(&headers, ORIGINAL_DESTINATION_HEADER),
            Some(b"product.updated".as_slice())
        );

        let headers = dead_letter_headers("product.updated", Some(3));
        assert_eq!(header_value(&headers, RETRY_COUNT_HEADER), Some(b"3".as_slice()));
    }
}
