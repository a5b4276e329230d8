use mockito::{mock, Mock};

pub struct MockWebserver {
    _mock: Mock,
}

impl MockWebserver {
    pub fn from_text(path: &str, method: &str, text: &str) -> Self {
        Self {
            _mock: mock(method, path).with_body(text).create(),
        }
    }

    pub fn from_json(path: &str, method: &str, json_string: &str) -> Self {
        Self {
            _mock: mock(method, path)
                .with_header("content-type", "application/json")
                .with_body(json_string)
                .create(),
        }
    }
}
