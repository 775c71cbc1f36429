use std::collections::BTreeMap;

/// String-to-optional-string label map. `None` values mean "label present,
/// no value" (a tag), matching how the source's v3 label shape is used by
/// search filters. `BTreeMap` gives deterministic iteration order for the
/// serialized markdown/journal payload.
pub type Labels = BTreeMap<String, Option<String>>;

/// Plain string properties attached to a Version. Unlike labels these are
/// always key+value; there is no bare-tag form.
pub type Properties = BTreeMap<String, String>;
