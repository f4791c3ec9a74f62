use crate::{
    error::ApiError,
    spotify::SpotifyClient,
    types::{Artist, FollowedArtistsResponse, GetSeveralArtistsResponse, Page},
};

impl SpotifyClient {
    /// Retrieves one page of followed artists from the Spotify Web API.
    ///
    /// Followed artists use cursor-based pagination: the cursor of the last
    /// artist on a page is passed as `after` to fetch the following page.
    ///
    /// # Arguments
    ///
    /// * `after` - Optional cursor, `None` for the first page
    /// * `limit` - Maximum number of artists to return in this request (1-50)
    ///
    /// # Returns
    ///
    /// - `Ok((Page<Artist>, Option<String>))` - the artists and the cursor of
    ///   the next page, `None` once the last page has been reached
    /// - `Err(ApiError)` - the raw request failure; rate limiting and server
    ///   errors are retried by the gateway, not here
    ///
    /// # Example
    ///
    /// ```
    /// let (page, next) = client.followed_artists_page(None, 50).await?;
    /// if let Some(cursor) = next {
    ///     let (more, _) = client.followed_artists_page(Some(cursor), 50).await?;
    /// }
    /// ```
    pub async fn followed_artists_page(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<(Page<Artist>, Option<String>), ApiError> {
        let mut path = format!("/me/following?type=artist&limit={limit}", limit = limit);
        if let Some(after_val) = &after {
            path.push_str(&format!("&after={}", after_val));
        }

        let res = self.get_json::<FollowedArtistsResponse>(&path).await?;
        let next_after = match res.artists.next {
            Some(_) => res.artists.cursors.and_then(|c| c.after),
            None => None,
        };

        Ok((
            Page {
                items: res.artists.items,
                next: next_after.clone(),
                total: res.artists.total,
            },
            next_after,
        ))
    }

    /// Looks up names for up to 50 artist ids in a single request.
    ///
    /// Unknown ids are answered with `null` by Spotify and are skipped.
    pub async fn several_artists(&self, ids: &[String]) -> Result<Vec<Artist>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/artists?ids={ids}", ids = ids.join(","));
        let res = self.get_json::<GetSeveralArtistsResponse>(&path).await?;
        Ok(res.artists.into_iter().flatten().collect())
    }
}
