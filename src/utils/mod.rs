//! Some utility functions

use minidom::Element;

use crate::event::Event;

/// Walks an XML tree and returns every element that has the given name
pub fn find_elems<S: AsRef<str>>(root: &Element, searched_name: S) -> Vec<&Element> {
    let searched_name = searched_name.as_ref();
    let mut elems: Vec<&Element> = Vec::new();

    for el in root.children() {
        if el.name() == searched_name {
            elems.push(el);
        } else {
            let ret = find_elems(el, searched_name);
            elems.extend(ret);
        }
    }
    elems
}

/// Walks an XML tree until it finds an elements with the given name
pub fn find_elem<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    if root.name() == searched_name {
        return Some(root);
    }

    for el in root.children() {
        if el.name() == searched_name {
            return Some(el);
        } else {
            let ret = find_elem(el, searched_name);
            if ret.is_some() {
                return ret;
            }
        }
    }
    None
}

/// A debug utility that pretty-prints events
pub fn print_event_list(events: &[Event]) {
    for event in events {
        let when = match event.all_day() {
            true => event.start().date().format("%Y-%m-%d").to_string(),
            false => event.start().as_datetime().format("%Y-%m-%d %H:%M").to_string(),
        };
        println!("    {}\t{}\t{}", when, event.name(), event.uid());
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_elements() {
        let root: Element = r#"<d:multistatus xmlns:d="DAV:">
                <d:response><d:href>/a/</d:href></d:response>
                <d:response><d:propstat><d:prop><d:href>/b/</d:href></d:prop></d:propstat></d:response>
            </d:multistatus>"#.parse().unwrap();

        assert_eq!(find_elems(&root, "response").len(), 2);
        assert_eq!(find_elems(&root, "href").len(), 2);
        assert_eq!(find_elem(&root, "href").map(|e| e.text()), Some("/a/".to_string()));
        assert!(find_elem(&root, "calendar-data").is_none());
    }
}
