mod age_rating;
mod comic_info;
mod manga;
mod page;
mod page_type;
mod yes_no;

pub use self::age_rating::AgeRating;
pub use self::comic_info::ComicInfo;
pub use self::manga::Manga;
pub use self::page::Page;
pub use self::page_type::PageType;
pub use self::yes_no::YesNo;

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace('/', "").replace('-', "").replace('_', "").replace(' ', "")
}
