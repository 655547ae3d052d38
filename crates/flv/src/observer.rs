use crate::tag::FlvTag;

/// Callbacks invoked by [`crate::parser::FlvTagIter`] for every parsed tag.
///
/// Lets a caller collect information while streaming through a file instead
/// of buffering all tags. All callbacks default to doing nothing. For one tag,
/// `on_tag` runs first, followed by the more specific callbacks that apply.
pub trait TagObserver {
    /// Any tag.
    fn on_tag(&mut self, _tag: &FlvTag) {}

    /// The first audio or video tag of the file.
    fn on_first_media_tag(&mut self, _tag: &FlvTag) {}

    /// A video tag with the keyframe frame type.
    fn on_keyframe(&mut self, _tag: &FlvTag) {}

    /// An `onMetaData` script tag.
    fn on_metadata(&mut self, _tag: &FlvTag) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TagObserver for NoopObserver {}

/// Dispatches one tag to the observer callbacks. `seen_media` tracks whether
/// the first media tag was already reported.
pub(crate) fn notify(observer: &mut dyn TagObserver, tag: &FlvTag, seen_media: &mut bool) {
    observer.on_tag(tag);

    if (tag.is_audio() || tag.is_video()) && !*seen_media {
        *seen_media = true;
        observer.on_first_media_tag(tag);
    }
    if tag.is_keyframe() {
        observer.on_keyframe(tag);
    }
    if tag.is_metadata() {
        observer.on_metadata(tag);
    }
}
